use std::any::Any;

use thiserror::Error;

/// Failures surfaced by the host at its render boundary.
#[derive(Debug, Error)]
pub enum HostError {
	/// The render function of `component`, or a derivation it evaluated,
	/// panicked. The component keeps its previous output.
	#[error("render of component `{component}` panicked: {message}")]
	RenderPanicked {
		component: &'static str,
		message: String,
	},

	/// Re-renders kept scheduling further re-renders.
	#[error("render queue did not settle after {passes} passes")]
	RenderLoop { passes: usize },
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"<non-string panic payload>".to_string()
	}
}
