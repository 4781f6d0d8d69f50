/// The relay runtime event loop.
///
/// A single async task that owns all protocol state and multiplexes
/// over the role-flip timer, radio deliveries, and application
/// commands. Radio failures never disturb the timer: the next flip
/// stays on schedule regardless.
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::radio::{Advertisement, DisplaySink, Radio};

use super::executor::execute_effects;
use super::state::RelayState;
use super::{RelayConfig, RelayEvent, Role, RuntimeCommand};

/// Depth of the advertisement delivery channel. The radio pushes into
/// it; the loop is the single consumer, which serializes delivery with
/// the scheduler's own transitions.
const ADV_CHANNEL_DEPTH: usize = 64;

/// Main event loop — owns all protocol state.
pub(super) async fn runtime_loop<R: Radio>(
    radio: R,
    mut display: Box<dyn DisplaySink>,
    config: RelayConfig,
    mut cmd_rx: mpsc::Receiver<RuntimeCommand>,
    event_tx: mpsc::Sender<RelayEvent>,
) {
    let (adv_tx, mut adv_rx) = mpsc::channel::<Advertisement>(ADV_CHANNEL_DEPTH);

    let mut state = RelayState::new(config);

    let effects = state.start();
    execute_effects(effects, &radio, &adv_tx, display.as_mut(), &event_tx).await;
    let mut flip_at = Instant::now() + state.current_window();

    loop {
        tokio::select! {
            // ── 1. Role-flip timer ───────────────────────────────
            _ = tokio::time::sleep_until(flip_at) => {
                let effects = state.flip_role();
                execute_effects(effects, &radio, &adv_tx, display.as_mut(), &event_tx).await;
                // Deadline advances whether or not the radio cooperated.
                flip_at = Instant::now() + state.current_window();
            }

            // ── 2. Advertisements from the radio ─────────────────
            Some(adv) = adv_rx.recv() => {
                if state.role() == Role::Listening {
                    let effects = state.handle_advertisement(&adv);
                    execute_effects(effects, &radio, &adv_tx, display.as_mut(), &event_tx).await;
                } else {
                    // Straggler delivered after the role flipped.
                    tracing::debug!("dropping advertisement received while broadcasting");
                }
            }

            // ── 3. Commands from the application ─────────────────
            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    RuntimeCommand::SetDistressMode(on) => {
                        state.set_distress_mode(on);
                    }
                    RuntimeCommand::GetPeerCount { reply } => {
                        let _ = reply.send(state.peer_count());
                    }
                    RuntimeCommand::Shutdown => break,
                }
            }

            else => break,
        }
    }

    // Graceful shutdown: the pending flip is cancelled by falling out
    // of the select; stop the radio best-effort.
    let effects = state.shutdown();
    execute_effects(effects, &radio, &adv_tx, display.as_mut(), &event_tx).await;
    tracing::debug!("relay runtime stopped");
}
