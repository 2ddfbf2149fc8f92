use std::sync::mpsc::{self, SyncSender};
use std::thread;

use crate::error::{MailError, Result};

/// Runs `producer` on a scoped thread that pushes items into a buffer of at
/// most `capacity` entries, and drains that buffer on the calling thread.
///
/// The producer's own result travels on a separate completion channel. The
/// buffer is drained until the producer hangs up, and only then is the
/// completion awaited, so a producer that outruns the buffer never blocks
/// forever.
pub fn drain_bounded<T, F>(capacity: usize, producer: F) -> Result<Vec<T>>
where
    T: Send,
    F: FnOnce(&SyncSender<T>) -> Result<()> + Send,
{
    let (tx, rx) = mpsc::sync_channel(capacity.max(1));
    let (done_tx, done_rx) = mpsc::sync_channel::<Result<()>>(1);

    thread::scope(|s| {
        s.spawn(move || {
            let res = producer(&tx);
            drop(tx);
            let _ = done_tx.send(res);
        });

        let items: Vec<T> = rx.iter().collect();
        let done = done_rx
            .recv()
            .unwrap_or_else(|_| Err(MailError::Protocol("fetch ended without a result".into())));
        done.map(|()| items)
    })
}

/// Sends one item, treating a vanished consumer as a protocol failure.
pub fn push<T>(out: &SyncSender<T>, item: T) -> Result<()> {
    out.send(item)
        .map_err(|_| MailError::Protocol("fetch consumer went away".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_more_items_than_capacity() {
        let items = drain_bounded(2, |tx| {
            for i in 0..100u32 {
                push(tx, i)?;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(items, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn producer_error_wins_over_partial_items() {
        let res = drain_bounded(1, |tx| {
            push(tx, 1u32)?;
            push(tx, 2u32)?;
            Err(MailError::Protocol("FETCH failed".into()))
        });
        assert!(matches!(res, Err(MailError::Protocol(m)) if m == "FETCH failed"));
    }

    #[test]
    fn zero_capacity_still_works() {
        let items = drain_bounded(0, |tx| push(tx, "a")).unwrap();
        assert_eq!(items, vec!["a"]);
    }
}
