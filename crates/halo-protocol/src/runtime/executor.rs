//! Effect executor — the only place that touches the radio and display.
//!
//! Takes a list of RelayEffect and executes them concretely:
//! - StartListening / StopListening / StartBroadcasting / StopBroadcasting
//!   -> Radio calls (failures logged + surfaced, never fatal)
//! - Show -> display.show()
//! - Emit -> event_tx

use tokio::sync::mpsc;

use crate::radio::{Advertisement, DisplaySink, Radio};

use super::effect::RelayEffect;
use super::RelayEvent;

/// Execute a list of effects against the radio, display, and channels.
pub(super) async fn execute_effects<R: Radio>(
    effects: Vec<RelayEffect>,
    radio: &R,
    adv_tx: &mpsc::Sender<Advertisement>,
    display: &mut dyn DisplaySink,
    event_tx: &mpsc::Sender<RelayEvent>,
) {
    for effect in effects {
        match effect {
            RelayEffect::StartListening => {
                if let Err(e) = radio.start_listening(adv_tx.clone()).await {
                    surface_radio_error(event_tx, "start listening", &e);
                }
            }
            RelayEffect::StopListening => {
                if let Err(e) = radio.stop_listening().await {
                    // Partial completion is acceptable; just report it.
                    surface_radio_error(event_tx, "stop listening", &e);
                }
            }
            RelayEffect::StartBroadcasting { power, payload } => {
                if let Err(e) = radio.start_broadcasting(power, &payload).await {
                    surface_radio_error(event_tx, "start broadcasting", &e);
                }
            }
            RelayEffect::StopBroadcasting => {
                if let Err(e) = radio.stop_broadcasting().await {
                    surface_radio_error(event_tx, "stop broadcasting", &e);
                }
            }
            RelayEffect::Show { key, line } => {
                display.show(&key, &line);
            }
            RelayEffect::Emit(event) => {
                // try_send: never block the loop; large buffer + fast
                // consumer keeps this reliable.
                let _ = event_tx.try_send(event);
            }
        }
    }
}

fn surface_radio_error(
    event_tx: &mpsc::Sender<RelayEvent>,
    what: &str,
    e: &crate::error::HaloError,
) {
    tracing::warn!("{what} failed: {e}");
    let _ = event_tx.try_send(RelayEvent::Error {
        description: format!("{what} failed: {e}"),
    });
}
