use std::sync::Arc;

use serde_json::Value;
use spotibot_core::openai::ScriptedModel;
use spotibot_core::retry::RetryPolicy;
use spotibot_core::spotify::FakeSpotify;
use spotibot_core::Session;

/// A session whose model answers `name(arguments)` once, over `spotify`.
pub fn session_calling(
    name: &str,
    arguments: Value,
    spotify: FakeSpotify,
) -> (Session, Arc<FakeSpotify>) {
    let spotify = Arc::new(spotify);
    let model = Arc::new(ScriptedModel::new().call(name, arguments));
    let session = Session::new(model, spotify.clone(), RetryPolicy::immediate(3));
    (session, spotify)
}

/// Texts the user would see for the executed operation, in order.
pub fn rendered(report: &spotibot_core::TurnReport) -> Vec<String> {
    report
        .outcome
        .as_ref()
        .map(|o| {
            o.replies
                .iter()
                .map(|r| r.history_text().to_string())
                .collect()
        })
        .unwrap_or_default()
}
