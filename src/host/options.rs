/// Tunables of a [`Host`](super::Host).
#[derive(Debug, Clone)]
pub struct HostOptions {
	/// Upper bound on queue passes per flush. A component that schedules
	/// itself again on every render hits this instead of spinning forever.
	pub max_render_passes: usize,
	/// Log a warning when a write schedules a re-render outside of
	/// [`Host::act`](super::Host::act).
	pub warn_outside_act: bool,
}

impl Default for HostOptions {
	fn default() -> Self {
		HostOptions {
			max_render_passes: 50,
			warn_outside_act: true,
		}
	}
}

impl HostOptions {
	pub fn max_render_passes(mut self, passes: usize) -> Self {
		self.max_render_passes = passes;
		self
	}

	pub fn warn_outside_act(mut self, warn: bool) -> Self {
		self.warn_outside_act = warn;
		self
	}
}
