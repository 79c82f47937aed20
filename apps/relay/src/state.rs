use permwatch_application::RelayService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The relay pipeline service behind every push delivery.
    pub relay_service: RelayService,
}
