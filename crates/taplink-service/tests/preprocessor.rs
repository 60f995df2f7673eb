//! Token transition and exit timer scenarios.

mod common;

use common::{Harness, TestPlatform, settle, settle_for, token};
use rstest::rstest;
use taplink_core::{Scan, Token};
use taplink_service::ServiceConfig;

fn hold_mode(delay_secs: u64) -> ServiceConfig {
    ServiceConfig::default()
        .hold_mode(true)
        .exit_delay_secs(delay_secs)
}

/// Insert `token`, receive its launch and report it as the running
/// software.
async fn launch(harness: &mut Harness, token: &Token) {
    harness.insert(token);
    settle().await;
    assert_eq!(harness.launches(), vec![token.clone()]);
    harness.handle.notify_software(Some(token.clone()));
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_one_launch_per_run_of_equal_tokens() {
    let mut harness = Harness::start(TestPlatform::new(), ServiceConfig::default());
    let a = token("A");
    let b = token("B");

    harness.insert(&a);
    harness.insert(&a);
    harness.insert(&a);
    harness.insert(&b);
    harness.insert(&b);
    harness.remove();
    harness.remove();
    harness.insert(&a);
    settle().await;

    assert_eq!(harness.launches(), vec![a.clone(), b, a]);
    assert_eq!(harness.platform.success_sounds(), 3);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_active_token_follows_reader() {
    let harness = Harness::start(TestPlatform::new(), ServiceConfig::default());
    let registry = harness.handle.registry().clone();
    let a = token("A");

    harness.insert(&a);
    settle().await;
    assert_eq!(registry.active_token().await, Some(a.clone()));

    harness.remove();
    settle().await;
    assert_eq!(registry.active_token().await, None);
    assert_eq!(registry.last_scanned().await, Some(a));
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_written_token_echo_suppressed_once() {
    let mut harness = Harness::start(TestPlatform::new(), ServiceConfig::default());
    let registry = harness.handle.registry().clone();
    let a = token("A");

    registry.set_wrote_token(Some(a.clone())).await;
    harness.insert(&a);
    settle().await;
    assert!(harness.launches().is_empty());
    assert_eq!(registry.wrote_token().await, None);
    assert_eq!(registry.active_token().await, Some(a.clone()));

    harness.remove();
    harness.insert(&a);
    settle().await;
    assert_eq!(harness.launches(), vec![a]);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_other_token_clears_written_token() {
    let mut harness = Harness::start(TestPlatform::new(), ServiceConfig::default());
    let registry = harness.handle.registry().clone();

    registry.set_wrote_token(Some(token("B"))).await;
    harness.insert(&token("A"));
    settle().await;

    assert_eq!(harness.launches(), vec![token("A")]);
    assert_eq!(registry.wrote_token().await, None);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_script_execution_disabled() {
    let config = ServiceConfig::default().script_execution(false);
    let mut harness = Harness::start(TestPlatform::new(), config);
    let a = token("A");

    harness.insert(&a);
    settle().await;

    assert!(harness.launches().is_empty());
    assert_eq!(harness.platform.success_sounds(), 0);
    assert_eq!(harness.handle.registry().active_token().await, Some(a));
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_fail_feedback_rate_limited() {
    let mut harness = Harness::start(TestPlatform::new(), ServiceConfig::default());
    let a = token("A");

    harness.insert(&a);
    settle().await;
    harness.fail("crc error");
    settle_for(400).await;
    harness.fail("crc error");
    settle().await;

    assert_eq!(harness.platform.fail_sounds(), 1);

    // Errors leave the previous token in place.
    harness.insert(&a);
    settle().await;
    assert_eq!(harness.launches(), vec![a]);

    settle_for(1500).await;
    harness.fail("timeout");
    settle().await;
    assert_eq!(harness.platform.fail_sounds(), 2);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_no_exit_without_hold_mode() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, ServiceConfig::default());
    let a = token("A");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(30_000).await;

    assert_eq!(harness.platform.kills(), 0);
    assert_eq!(harness.handle.registry().software_token().await, Some(a));
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_exit_after_delay() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));
    let a = token("A");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(4_900).await;
    assert_eq!(harness.platform.kills(), 0);

    settle_for(200).await;
    assert_eq!(harness.platform.kills(), 1);
    assert_eq!(harness.handle.registry().software_token().await, None);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_delay_exits_immediately() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(0));

    launch(&mut harness, &token("A")).await;
    harness.remove();
    settle().await;

    assert_eq!(harness.platform.kills(), 1);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_reinsert_software_token_cancels_exit() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));
    let a = token("A");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(2_000).await;

    harness.insert(&a);
    settle().await;
    assert!(harness.launches().is_empty());

    settle_for(10_000).await;
    assert_eq!(harness.platform.kills(), 0);
    assert_eq!(harness.platform.success_sounds(), 1);
    assert_eq!(harness.handle.registry().software_token().await, Some(a));
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_different_token_restarts_exit_timer() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));
    let a = token("A");
    let b = token("B");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(2_000).await;

    harness.insert(&b);
    settle().await;
    assert_eq!(harness.launches(), vec![b]);

    // The original deadline passes; the restarted timer is still pending.
    settle_for(4_800).await;
    assert_eq!(harness.platform.kills(), 0);

    settle_for(300).await;
    assert_eq!(harness.platform.kills(), 1);
    assert_eq!(harness.handle.registry().software_token().await, None);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_new_software_token_cancels_exit() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));
    let b = token("B");

    launch(&mut harness, &token("A")).await;
    harness.remove();
    settle_for(1_000).await;

    // Software started from somewhere other than a reader.
    harness.handle.notify_software(Some(b.clone()));
    settle_for(10_000).await;

    assert_eq!(harness.platform.kills(), 0);
    assert_eq!(harness.handle.registry().software_token().await, Some(b));
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_same_software_token_keeps_exit_pending() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));
    let a = token("A");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(1_000).await;

    harness.handle.notify_software(Some(a));
    settle_for(5_000).await;

    assert_eq!(harness.platform.kills(), 1);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_reinsert_after_exit_launches_again() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(1));
    let a = token("A");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(2_000).await;
    assert_eq!(harness.platform.kills(), 1);

    harness.insert(&a);
    settle().await;
    assert_eq!(harness.launches(), vec![a]);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_kill_failure_still_clears_software() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    platform.fail_kills("launcher not responding");
    let mut harness = Harness::start(platform, hold_mode(0));

    launch(&mut harness, &token("A")).await;
    harness.remove();
    settle().await;

    assert_eq!(harness.platform.kills(), 1);
    assert_eq!(harness.handle.registry().software_token().await, None);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_exit_skipped_when_launcher_gone() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));
    let a = token("A");

    launch(&mut harness, &a).await;
    harness.remove();
    settle_for(1_000).await;

    // User quit the software by other means before the delay elapsed.
    harness.platform.set_active_launcher(None);
    settle_for(5_000).await;

    assert_eq!(harness.platform.kills(), 0);
    assert_eq!(harness.handle.registry().software_token().await, Some(a));
    harness.stop().await;
}

#[rstest]
#[case::eligible(true, Some("retroarch"), false, None, 1)]
#[case::hold_mode_off(false, Some("retroarch"), false, None, 0)]
#[case::no_launcher(true, None, false, None, 0)]
#[case::remote_token(true, Some("retroarch"), true, None, 0)]
#[case::blocklisted(true, Some("RetroArch"), false, Some("retroarch"), 0)]
#[case::other_blocklisted(true, Some("retroarch"), false, Some("mplayer"), 1)]
#[tokio::test(start_paused = true)]
async fn test_exit_eligibility(
    #[case] hold: bool,
    #[case] launcher: Option<&str>,
    #[case] remote: bool,
    #[case] blocked: Option<&str>,
    #[case] expected_kills: usize,
) {
    let platform = TestPlatform::new();
    platform.set_active_launcher(launcher);

    let mut config = ServiceConfig::default().hold_mode(hold).exit_delay_secs(1);
    if let Some(blocked) = blocked {
        config = config.block_exit(blocked);
    }

    let mut harness = Harness::start(platform, config);
    let a = Token::builder().uid("A").remote(remote).build().unwrap();

    assert!(
        harness
            .handle
            .inject_scan(Scan::inserted("api", a.clone()))
    );
    settle().await;
    assert_eq!(harness.launches(), vec![a.clone()]);
    harness.handle.notify_software(Some(a));
    settle().await;

    harness.remove();
    settle_for(3_000).await;

    assert_eq!(harness.platform.kills(), expected_kills);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_exit() {
    let platform = TestPlatform::new().with_launcher("retroarch");
    let mut harness = Harness::start(platform, hold_mode(5));

    launch(&mut harness, &token("A")).await;
    harness.remove();
    settle_for(1_000).await;

    let platform = harness.platform.clone();
    harness.stop().await;
    settle_for(10_000).await;

    assert_eq!(platform.kills(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_launch_queue_closed_after_shutdown() {
    let mut harness = Harness::start(TestPlatform::new(), ServiceConfig::default());
    harness.insert(&token("A"));
    settle().await;

    harness.handle.shutdown();
    (&mut harness.task).await.unwrap();

    assert_eq!(harness.handle.recv_launch().await, Some(token("A")));
    assert_eq!(harness.handle.recv_launch().await, None);
}
