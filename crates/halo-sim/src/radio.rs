//! Simulated radio — one per node, all tuned to the same [`Air`].
//!
//! Listening subscribes to the medium and forwards everything audible
//! as scan results. Broadcasting re-transmits the current payload at a
//! fixed advertising interval until stopped, the way a real
//! advertisement train repeats.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use halo_protocol::{Advertisement, HaloError, Radio, TxPowerLevel};

use crate::air::{link_rssi, Air, Transmission};

/// How often a broadcasting radio repeats its advertisement.
const ADV_INTERVAL: Duration = Duration::from_millis(120);

pub struct SimRadio {
    address: [u8; 6],
    air: Air,
    listen_task: Mutex<Option<JoinHandle<()>>>,
    broadcast_task: Mutex<Option<JoinHandle<()>>>,
}

impl SimRadio {
    pub fn new(address: [u8; 6], air: Air) -> Self {
        Self {
            address,
            air,
            listen_task: Mutex::new(None),
            broadcast_task: Mutex::new(None),
        }
    }

    fn replace_task(slot: &Mutex<Option<JoinHandle<()>>>, task: Option<JoinHandle<()>>) {
        let mut guard = match slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(old) = guard.take() {
            old.abort();
        }
        *guard = task;
    }
}

impl Drop for SimRadio {
    fn drop(&mut self) {
        Self::replace_task(&self.listen_task, None);
        Self::replace_task(&self.broadcast_task, None);
    }
}

#[async_trait::async_trait]
impl Radio for SimRadio {
    async fn start_listening(&self, events: mpsc::Sender<Advertisement>) -> Result<(), HaloError> {
        let mut rx = self.air.tune_in();
        let own = self.address;

        let task = tokio::spawn(async move {
            // Send-safe rng; the task holds it across awaits.
            let mut rng = StdRng::from_os_rng();
            while let Ok(transmission) = rx.recv().await {
                if transmission.from == own {
                    continue;
                }
                let Some(rssi_dbm) = link_rssi(transmission.power, transmission.from, own, &mut rng)
                else {
                    continue;
                };
                let adv = Advertisement {
                    address: transmission.from,
                    rssi_dbm,
                    service_data: transmission.payload,
                };
                if events.send(adv).await.is_err() {
                    break;
                }
            }
        });

        Self::replace_task(&self.listen_task, Some(task));
        Ok(())
    }

    async fn stop_listening(&self) -> Result<(), HaloError> {
        Self::replace_task(&self.listen_task, None);
        Ok(())
    }

    async fn start_broadcasting(
        &self,
        power: TxPowerLevel,
        payload: &[u8],
    ) -> Result<(), HaloError> {
        let air = self.air.clone();
        let from = self.address;
        let payload = payload.to_vec();

        let task = tokio::spawn(async move {
            loop {
                air.transmit(Transmission {
                    from,
                    power,
                    payload: payload.clone(),
                });
                tokio::time::sleep(ADV_INTERVAL).await;
            }
        });

        Self::replace_task(&self.broadcast_task, Some(task));
        Ok(())
    }

    async fn stop_broadcasting(&self) -> Result<(), HaloError> {
        Self::replace_task(&self.broadcast_task, None);
        Ok(())
    }
}
