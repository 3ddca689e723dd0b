// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Terminal rendition of transfer notifications: one spinner line per notification.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tiplib::notification::{Notification, NotificationId, Notifier, Severity};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) struct ConsoleNotifier {
    next_id: AtomicU64,
    bars: Mutex<HashMap<NotificationId, ProgressBar>>,
    hidden: bool,
}

impl ConsoleNotifier {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            bars: Mutex::new(HashMap::new()),
            hidden: false,
        }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::new()
        }
    }

    fn spinner(&self) -> ProgressBar {
        if self.hidden {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        match ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            Ok(style) => bar.set_style(style),
            Err(err) => warn!("Falling back to the default spinner style: {err}"),
        }
        bar
    }

    fn render(bar: &ProgressBar, notification: &Notification) {
        let line = format!("{}: {}", notification.message, notification.description);
        match notification.severity {
            Severity::Info => {
                bar.set_message(line);
                bar.enable_steady_tick(TICK_INTERVAL);
            }
            Severity::Success => bar.finish_with_message(format!("✔ {line}")),
            Severity::Error => bar.abandon_with_message(format!("✘ {line}")),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn open(&self, notification: &Notification) -> NotificationId {
        let id = NotificationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let bar = self.spinner();
        Self::render(&bar, notification);
        match self.bars.lock() {
            Ok(mut bars) => {
                let _ = bars.insert(id, bar);
            }
            Err(err) => error!("Notification {id} is not tracked: {err}"),
        }
        id
    }

    fn update(&self, id: NotificationId, notification: &Notification) {
        match self.bars.lock() {
            Ok(bars) => match bars.get(&id) {
                Some(bar) => Self::render(bar, notification),
                None => debug!("Notification {id} is gone, dropping the update"),
            },
            Err(err) => error!("Could not update notification {id}: {err}"),
        }
    }

    fn dismiss(&self, id: NotificationId) {
        let bar = match self.bars.lock() {
            Ok(mut bars) => bars.remove(&id),
            Err(err) => {
                error!("Could not dismiss notification {id}: {err}");
                None
            }
        };
        // finished lines stay on screen as a record of the transfer
        if let Some(bar) = bar.filter(|bar| !bar.is_finished()) {
            bar.finish_and_clear();
        }
    }
}
