use rpac_hardware::Signal;
use rpac_hardware::mock::{MockInputPin, MockInputPinHandle};
use rpac_hardware::monitor::{InputMonitor, MonitorHandle};
use std::time::Duration;
use tokio::time::sleep;

const WINDOW: Duration = Duration::from_millis(200);

fn presence_monitor(initial: bool) -> (MonitorHandle, MockInputPinHandle) {
    let mut monitor = InputMonitor::new(WINDOW);
    let (pin, line) = MockInputPin::new(initial);
    line.connect(monitor.register(Signal::Presence, pin));
    (monitor.start().unwrap(), line)
}

#[tokio::test(start_paused = true)]
async fn commits_only_after_window_holds() {
    let (handle, line) = presence_monitor(false);

    line.set_level(true);
    sleep(Duration::from_millis(199)).await;
    assert!(!handle.read(Signal::Presence));

    sleep(Duration::from_millis(2)).await;
    assert!(handle.read(Signal::Presence));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn bounce_restarts_window() {
    let (handle, line) = presence_monitor(false);

    line.set_level(true);
    sleep(Duration::from_millis(150)).await;
    line.set_level(false);
    sleep(Duration::from_millis(10)).await;
    line.set_level(true);

    // 310 ms after the first edge, but only 150 ms after the last one.
    sleep(Duration::from_millis(150)).await;
    assert!(!handle.read(Signal::Presence));

    sleep(Duration::from_millis(60)).await;
    assert!(handle.read(Signal::Presence));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn short_pulse_never_commits() {
    let (handle, line) = presence_monitor(true);

    line.set_level(false);
    sleep(Duration::from_millis(50)).await;
    line.set_level(true);

    sleep(Duration::from_secs(2)).await;
    assert!(handle.read(Signal::Presence));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn glitch_without_level_change_is_ignored() {
    let (handle, line) = presence_monitor(false);

    for _ in 0..10 {
        line.glitch();
        sleep(Duration::from_millis(30)).await;
    }
    sleep(WINDOW).await;
    assert!(!handle.read(Signal::Presence));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn signals_debounce_independently() {
    let mut monitor = InputMonitor::new(WINDOW);
    let (presence, presence_line) = MockInputPin::new(false);
    let (button, button_line) = MockInputPin::new(false);
    presence_line.connect(monitor.register(Signal::Presence, presence));
    button_line.connect(monitor.register(Signal::PowerButton, button));
    let handle = monitor.start().unwrap();
    let reader = handle.reader();

    presence_line.set_level(true);
    sleep(Duration::from_millis(100)).await;
    button_line.set_level(true);

    sleep(Duration::from_millis(120)).await;
    assert!(reader.read(Signal::Presence));
    assert!(!reader.read(Signal::PowerButton));

    sleep(Duration::from_millis(100)).await;
    assert!(reader.read(Signal::PowerButton));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn read_failure_does_not_stop_monitoring() {
    let (handle, line) = presence_monitor(false);

    line.set_failing(true);
    line.glitch();
    sleep(Duration::from_millis(10)).await;
    assert!(!handle.read(Signal::Presence));

    line.set_failing(false);
    line.set_level(true);
    sleep(Duration::from_secs(2)).await;
    assert!(handle.read(Signal::Presence));

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn edge_lost_to_read_failure_is_resampled() {
    let (handle, line) = presence_monitor(false);

    // The only edge arrives while reads fail.
    line.set_failing(true);
    line.set_level(true);
    sleep(Duration::from_millis(20)).await;
    line.set_failing(false);

    sleep(WINDOW + Duration::from_millis(100)).await;
    assert!(handle.read(Signal::Presence));

    handle.shutdown().await.unwrap();
}
