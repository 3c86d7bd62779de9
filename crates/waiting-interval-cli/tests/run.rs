use std::time::Duration;

use waiting_interval_cli::{run, Config};

fn config(delays_ms: &[u64], firings: usize, fail_on: Option<usize>) -> Config {
    Config {
        delays: delays_ms.iter().copied().map(Duration::from_millis).collect(),
        firings,
        fail_on,
        log_level: "info".to_string(),
    }
}

fn assert_fired_near(got: &[Duration], want_ms: &[u64]) {
    assert_eq!(got.len(), want_ms.len(), "firings: {got:?}");
    for (got, &want) in got.iter().zip(want_ms) {
        let want = Duration::from_millis(want);
        assert!(
            *got >= want && *got < want + Duration::from_millis(2),
            "fired at {got:?}, expected ~{want:?}"
        );
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn runs_the_requested_number_of_firings() {
    let report = run(&config(&[16, 8, 4, 2], 5, None)).await.unwrap();

    assert!(!report.halted);
    assert_fired_near(&report.fired_at, &[2, 6, 14, 30, 46]);
    assert_eq!(report.remaining_delays, vec![Duration::from_millis(16)]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn handler_failure_is_reported_as_a_halt() {
    let report = run(&config(&[16, 8, 4, 2], 5, Some(2))).await.unwrap();

    assert!(report.halted);
    assert_fired_near(&report.fired_at, &[2, 6]);
    // Two delays were taken before the failing firing; nothing was re-armed after it.
    assert_eq!(
        report.remaining_delays,
        vec![Duration::from_millis(16), Duration::from_millis(8)]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn empty_delay_list_is_an_error() {
    let err = run(&config(&[], 3, None)).await.unwrap_err();
    assert_eq!(err.to_string(), "delay sequence cannot be empty");
}
