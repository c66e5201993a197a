//! A single haircut, run on its own thread per dispatch.

use std::time::Duration;

use crossbeam::channel::{Receiver, Sender};
use tracing::debug;

use crate::types::{BarberId, Client, Finished};

/// Cut `client`'s hair for `cutting_time`, then report back exactly once.
///
/// Returns `false` without reporting if `shutdown` fires first or the shop
/// is no longer listening.
pub fn cut_hair(
    barber: BarberId,
    client: Client,
    cutting_time: Duration,
    finished: Sender<Finished>,
    shutdown: Receiver<()>,
) -> bool {
    crossbeam::channel::select! {
        recv(shutdown) -> _ => {
            debug!(barber, client = client.id, "cut interrupted by shutdown");
            false
        },
        default(cutting_time) => {
            finished
                .send(Finished {
                    barber,
                    client: client.id,
                })
                .is_ok()
        },
    }
}
