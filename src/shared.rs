//! [`SharedSession`] allows a single [`Session`] to be used from multiple
//! threads
use crate::driver::{D2xx, Driver};
use crate::Session;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A [`Session`] behind a mutex.  Clones refer to the same session.
///
/// Each native call is made with the lock held, so calls from different
/// threads are serialized.  Hold the guard from [`SharedSession::lock`] to
/// make a sequence of calls without other threads interleaving.
#[derive(Debug)]
pub struct SharedSession<'d, D: Driver + ?Sized = D2xx> {
    inner: Arc<Mutex<Session<'d, D>>>,
}

impl<'d, D: Driver + ?Sized> Clone for SharedSession<'d, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<'d, D: Driver + ?Sized> SharedSession<'d, D> {
    pub fn new(session: Session<'d, D>) -> Self {
        trace!("SharedSession::new");
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Locks the session, blocking until any other holder releases it
    pub fn lock(&self) -> MutexGuard<'_, Session<'d, D>> {
        self.inner.lock()
    }

    /// Runs `f` with the session locked
    pub fn with<R>(&self, f: impl FnOnce(&mut Session<'d, D>) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }
}
