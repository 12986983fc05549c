use stagehand_kernel::prelude::*;

#[derive(Debug, Default)]
struct Recorder {
    timeline: Timeline<&'static str>,
    applied: Vec<(Millis, &'static str)>,
}

impl Pump for Recorder {
    fn next_due(&self) -> Option<Millis> {
        self.timeline.next_due()
    }

    fn pump_to(&mut self, now: Millis) -> usize {
        let mut count = 0;
        while let Some(entry) = self.timeline.pop_due(now) {
            self.applied.push((entry.due, entry.effect));
            count += 1;
        }
        count
    }
}

#[tokio::test(start_paused = true)]
async fn drive_applies_entries_in_order_and_goes_idle() {
    let clock = TokioClock::start();
    let mut recorder = Recorder::default();
    recorder.timeline.schedule_in(2_000, Owner::Conversation, "reply");
    recorder.timeline.schedule_in(100, Owner::Conversation, "typing");

    let mut batches = 0;
    let summary = drive(&mut recorder, &clock, None, |_| batches += 1).await;

    assert!(summary.idle);
    assert_eq!(summary.applied, 2);
    assert_eq!(batches, 2);
    assert_eq!(
        recorder.applied,
        vec![(100, "typing"), (2_000, "reply")]
    );
    assert!(clock.now() >= 2_000);
}

#[tokio::test(start_paused = true)]
async fn drive_stops_at_limit() {
    let clock = TokioClock::with_speed(10.0);
    let mut recorder = Recorder::default();
    recorder.timeline.schedule_in(500, Owner::Conversation, "early");
    recorder.timeline.schedule_in(5_000, Owner::Conversation, "late");

    let summary = drive(&mut recorder, &clock, Some(1_000), |_| {}).await;

    assert!(!summary.idle);
    assert_eq!(summary.applied, 1);
    assert_eq!(recorder.timeline.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn superseded_generation_never_fires_through_driver() {
    let clock = TokioClock::start();
    let mut recorder = Recorder::default();

    let old = recorder.timeline.begin_generation();
    recorder.timeline.schedule_in(300, Owner::Scene(old), "old");
    let new = recorder.timeline.begin_generation();
    recorder.timeline.schedule_in(600, Owner::Scene(new), "new");

    drive(&mut recorder, &clock, None, |_| {}).await;

    assert_eq!(recorder.applied, vec![(600, "new")]);
    assert_eq!(recorder.timeline.stats().purged, 1);
}
