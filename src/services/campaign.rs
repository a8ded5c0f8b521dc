//! Promotional campaign and its countdown ticker.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

const TICK: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub finished: bool,
}

impl Countdown {
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total = (target - now).num_seconds().max(0);
        Self {
            days: total / 86_400,
            hours: (total % 86_400) / 3_600,
            minutes: (total % 3_600) / 60,
            seconds: total % 60,
            finished: total == 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Campaign {
    pub code: String,
    pub ends_at: DateTime<Utc>,
    pub percent_claimed: u8,
}

impl Campaign {
    pub fn new(code: impl Into<String>, ends_at: DateTime<Utc>, percent_claimed: f64) -> Self {
        let percent_claimed = if percent_claimed.is_finite() { percent_claimed.round().clamp(0.0, 100.0) as u8 } else { 0 };
        Self { code: code.into(), ends_at, percent_claimed }
    }

    /// Five days from `now`, at 23:59:59.
    pub fn default_end(now: DateTime<Utc>) -> DateTime<Utc> {
        let day = (now + Duration::days(5)).date_naive();
        day.and_hms_opt(23, 59, 59).map_or(now + Duration::days(5), |at| at.and_utc())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CampaignSnapshot {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub countdown: Countdown,
}

pub struct CampaignService {
    campaign: Campaign,
}

/// Running countdown. Dropping the handle stops the ticker.
pub struct CountdownTicker {
    receiver: watch::Receiver<Countdown>,
    task: JoinHandle<()>,
}

impl CountdownTicker {
    pub fn current(&self) -> Countdown { *self.receiver.borrow() }
    pub fn subscribe(&self) -> watch::Receiver<Countdown> { self.receiver.clone() }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) { self.task.abort(); }
}

impl CampaignService {
    pub fn new(campaign: Campaign) -> Self { Self { campaign } }

    pub fn campaign(&self) -> &Campaign { &self.campaign }

    pub fn snapshot(&self, now: DateTime<Utc>) -> CampaignSnapshot {
        CampaignSnapshot { campaign: self.campaign.clone(), countdown: Countdown::until(self.campaign.ends_at, now) }
    }

    /// Recomputes the countdown once a second until it finishes or the
    /// returned ticker is dropped.
    pub fn start_ticker(&self) -> CountdownTicker {
        let target = self.campaign.ends_at;
        let (sender, receiver) = watch::channel(Countdown::until(target, Utc::now()));
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                let countdown = Countdown::until(target, Utc::now());
                if sender.send(countdown).is_err() || countdown.finished {
                    debug!(finished = countdown.finished, "campaign ticker stopped");
                    break;
                }
            }
        });
        CountdownTicker { receiver, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_countdown_breakdown() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let target = now + Duration::days(2) + Duration::hours(3) + Duration::minutes(4) + Duration::seconds(5);
        assert_eq!(
            Countdown::until(target, now),
            Countdown { days: 2, hours: 3, minutes: 4, seconds: 5, finished: false }
        );
    }

    #[test]
    fn test_countdown_finished_when_past() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let past = Countdown::until(now - Duration::minutes(1), now);
        assert!(past.finished);
        assert_eq!((past.days, past.hours, past.minutes, past.seconds), (0, 0, 0, 0));
    }

    #[test]
    fn test_percent_claimed_is_clamped() {
        let at = Utc::now();
        assert_eq!(Campaign::new("X", at, 52.4).percent_claimed, 52);
        assert_eq!(Campaign::new("X", at, 140.0).percent_claimed, 100);
        assert_eq!(Campaign::new("X", at, -3.0).percent_claimed, 0);
        assert_eq!(Campaign::new("X", at, f64::NAN).percent_claimed, 0);
    }

    #[test]
    fn test_default_end() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        assert_eq!(Campaign::default_end(now), Utc.with_ymd_and_hms(2025, 6, 6, 23, 59, 59).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_updates_and_stops_on_drop() {
        let service = CampaignService::new(Campaign::new("BLACKBOX20", Utc::now() + Duration::hours(1), 10.0));
        let ticker = service.start_ticker();
        let mut rx = ticker.subscribe();
        assert!(!ticker.current().finished);

        tokio::time::advance(TICK).await;
        rx.changed().await.unwrap();
        assert!(!rx.borrow().finished);

        drop(ticker);
        while rx.changed().await.is_ok() {}
        assert!(rx.has_changed().is_err());
    }
}
