//! One-shot bridge from an asynchronous pipeline to a synchronous caller.

use crate::Error;
use std::{sync::mpsc, time::Duration};

/// Creates a connected completer/completion pair.
pub(crate) fn channel<T>() -> (Completer<T>, Completion<T>) {
    // Buffered so completing never blocks a pool thread, even when the
    // waiter timed out and went away.
    let (sender, receiver) = mpsc::sync_channel(1);
    (Completer { sender }, Completion { receiver })
}

/// Producer half: resolves the completion exactly once.
pub(crate) struct Completer<T> {
    sender: mpsc::SyncSender<Result<T, Error>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(self, result: Result<T, Error>) {
        // The waiter may already have abandoned the wait.
        let _ = self.sender.send(result);
    }
}

/// Consumer half: blocks the caller until the pipeline resolves.
///
/// Waiting with a deadline abandons the pipeline on expiry; it does NOT
/// cancel in-flight worker tasks. They run to completion in the background
/// and their results are discarded.
pub(crate) struct Completion<T> {
    receiver: mpsc::Receiver<Result<T, Error>>,
}

impl<T> Completion<T> {
    pub(crate) fn wait(self, deadline: Option<Duration>) -> Result<T, Error> {
        match deadline {
            None => self.receiver.recv().unwrap_or(Err(Error::Abandoned)),
            Some(limit) => match self.receiver.recv_timeout(limit) {
                Ok(result) => result,
                Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::Timeout(limit)),
                Err(mpsc::RecvTimeoutError::Disconnected) => Err(Error::Abandoned),
            },
        }
    }
}
