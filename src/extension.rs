//! Shared state handed to every provider.
//!
//! One [`Extension`] owns the resolved tmsu binary, the process runner, the
//! notification backend and a reference to the process-wide [`TaskQueue`].
//! Providers hold an `Arc<Extension>`; nothing here is a global.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Config;
use crate::error::TmsuResult;
use crate::executor::{ProcessRunner, SystemRunner};
use crate::notify::{self, Notifications};
use crate::queue::TaskQueue;
use crate::tmsu::{self, Tmsu};

pub struct Extension {
    config: Config,
    tmsu: Tmsu,
    runner: Arc<dyn ProcessRunner>,
    queue: Arc<TaskQueue>,
    notifications: Arc<dyn Notifications>,
    /// Last directory looked up by [`Extension::is_tracked_cached`]
    last_lookup: Mutex<Option<(PathBuf, bool)>>,
}

impl Extension {
    pub fn new(
        config: Config,
        tmsu: Tmsu,
        runner: Arc<dyn ProcessRunner>,
        queue: Arc<TaskQueue>,
        notifications: Arc<dyn Notifications>,
    ) -> Self {
        Self {
            config,
            tmsu,
            runner,
            queue,
            notifications,
            last_lookup: Mutex::new(None),
        }
    }

    /// Resolve tmsu and wire up the production runner and notifications.
    ///
    /// Fails when tmsu cannot be found; the host must not register the
    /// extension in that case.
    pub fn initialize(config: Config, queue: Arc<TaskQueue>) -> TmsuResult<Self> {
        let tmsu = Tmsu::locate(&config.tmsu)?;
        Ok(Self::with_tmsu(config, tmsu, queue))
    }

    /// Production wiring around an already located tmsu
    pub fn with_tmsu(config: Config, tmsu: Tmsu, queue: Arc<TaskQueue>) -> Self {
        let notifications: Arc<dyn Notifications> = Arc::from(notify::from_config(&config.notifications));
        Self::new(config, tmsu, Arc::new(SystemRunner), queue, notifications)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tmsu(&self) -> &Tmsu {
        &self.tmsu
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    pub fn notifications(&self) -> &Arc<dyn Notifications> {
        &self.notifications
    }

    /// Ask tmsu about `dir` synchronously
    pub fn is_tracked(&self, dir: &Path) -> bool {
        tmsu::is_database(&self.tmsu, self.runner(), dir)
    }

    /// Like [`Extension::is_tracked`], reusing the answer while consecutive
    /// calls ask about the same directory.
    pub fn is_tracked_cached(&self, dir: &Path) -> bool {
        let mut last = self
            .last_lookup
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_dir, tracked)) = last.as_ref() {
            if cached_dir == dir {
                return *tracked;
            }
        }
        let tracked = self.is_tracked(dir);
        *last = Some((dir.to_path_buf(), tracked));
        tracked
    }

    /// Forget the cached answer, e.g. after a database was created
    pub fn forget_tracked(&self) {
        *self
            .last_lookup
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}
