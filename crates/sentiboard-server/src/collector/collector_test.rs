use std::sync::Arc;
use std::time::Duration;

use sentiboard_core::{AppConfig, CorsOrigins, Environment, Sentiment, Source};
use sentiboard_sentiment::{
    Classifier, HttpSettings, RedditClient, RedditCredentials, SourceFetcher, TwitterClient,
};
use serde_json::json;
use tokio::sync::Notify;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::aggregate::Aggregator;
use crate::publisher::{DashboardEvent, Publisher};
use crate::settings::SharedSettings;

struct Harness {
    collector: Collector,
    aggregator: Arc<Aggregator>,
    publisher: Publisher,
    wake: Arc<Notify>,
}

fn options() -> CollectorOptions {
    CollectorOptions {
        demo_interval: Duration::from_secs(10),
        live_interval: Duration::from_secs(60),
        error_cooldown: Duration::from_secs(10),
        sample_count: 10,
        live_cycle_cap: None,
        release_after_cycle: false,
    }
}

fn harness(
    pipeline: Pipeline,
    options: CollectorOptions,
    terms: &[&str],
    max_items: usize,
) -> Harness {
    let settings = Arc::new(SharedSettings::new(
        terms.iter().map(|t| (*t).to_string()).collect(),
        max_items,
        500,
    ));
    let aggregator = Arc::new(Aggregator::new(100));
    let publisher = Publisher::new();
    let wake = Arc::new(Notify::new());
    let collector = Collector::new(
        pipeline,
        options,
        settings,
        Arc::clone(&aggregator),
        publisher.clone(),
        Arc::clone(&wake),
    );
    Harness {
        collector,
        aggregator,
        publisher,
        wake,
    }
}

fn http() -> HttpSettings {
    HttpSettings {
        timeout_secs: 5,
        user_agent: "sentiboard-test/0.1".to_string(),
        inter_request_delay_ms: 0,
    }
}

fn twitter(server: &MockServer) -> SourceFetcher {
    SourceFetcher::Twitter(
        TwitterClient::new("token", &http())
            .unwrap()
            .with_api_base(&server.uri()),
    )
}

fn reddit(server: &MockServer) -> SourceFetcher {
    let credentials = RedditCredentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        user_agent: "sentiboard-test/0.1".to_string(),
    };
    SourceFetcher::Reddit(
        RedditClient::new(credentials, &http())
            .unwrap()
            .with_base_urls(&server.uri(), &server.uri()),
    )
}

fn tweets(count: usize) -> serde_json::Value {
    let data: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "id": format!("{i}"),
                "text": format!("I love tweet {i}"),
                "created_at": "2024-05-01T12:00:00.000Z"
            })
        })
        .collect();
    json!({ "data": data })
}

fn posts(count: usize) -> serde_json::Value {
    let children: Vec<_> = (0..count)
        .map(|i| {
            json!({"data": {
                "title": format!("Great post {i}"),
                "permalink": format!("/r/all/comments/{i}/"),
                "created_utc": 1_714_564_800.0
            }})
        })
        .collect();
    json!({"data": {"children": children}})
}

async fn mount_twitter(server: &MockServer, count: usize) {
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tweets(count)))
        .mount(server)
        .await;
}

async fn mount_reddit(server: &MockServer, expected_limit: &str, count: usize) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/all/search"))
        .and(query_param("limit", expected_limit))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts(count)))
        .expect(1)
        .mount(server)
        .await;
}

#[test]
fn each_source_gets_integer_half() {
    assert_eq!(per_source_cap(10), 5);
    assert_eq!(per_source_cap(11), 5);
    assert_eq!(per_source_cap(1), 0);
}

#[tokio::test]
async fn live_cycle_merges_both_sources_in_fetch_order() {
    let twitter_server = MockServer::start().await;
    let reddit_server = MockServer::start().await;
    mount_twitter(&twitter_server, 3).await;
    mount_reddit(&reddit_server, "5", 2).await;

    let pipeline = Pipeline::Live {
        twitter: twitter(&twitter_server),
        reddit: reddit(&reddit_server),
        classifier: Classifier::lexicon(),
    };
    let h = harness(pipeline, options(), &["rust"], 10);
    let mut rx = h.publisher.subscribe();

    let report = h.collector.run_cycle().await;
    assert_eq!(report, CycleReport { collected: 5, merged: true });

    let snap = h.aggregator.snapshot();
    assert_eq!(snap.positive, 5);
    assert_eq!(snap.negative + snap.neutral, 0);
    assert_eq!(snap.sources.twitter, 3);
    assert_eq!(snap.sources.reddit, 2);
    let sources: Vec<_> = snap.recent_items.iter().map(|i| i.source).collect();
    assert_eq!(
        sources,
        vec![
            Source::Twitter,
            Source::Twitter,
            Source::Twitter,
            Source::Reddit,
            Source::Reddit
        ]
    );

    match rx.recv().await.unwrap() {
        DashboardEvent::Update(published) => assert_eq!(*published, snap),
        other => panic!("unexpected event {}", other.name()),
    }
}

#[tokio::test]
async fn max_items_is_split_between_sources_regardless_of_productivity() {
    let twitter_server = MockServer::start().await;
    let reddit_server = MockServer::start().await;
    mount_twitter(&twitter_server, 10).await;
    mount_reddit(&reddit_server, "5", 8).await;

    let pipeline = Pipeline::Live {
        twitter: twitter(&twitter_server),
        reddit: reddit(&reddit_server),
        classifier: Classifier::lexicon(),
    };
    let h = harness(pipeline, options(), &["rust"], 10);

    let report = h.collector.run_cycle().await;
    assert_eq!(report.collected, 10);
    let snap = h.aggregator.snapshot();
    assert_eq!(snap.sources.twitter, 5);
    assert_eq!(snap.sources.reddit, 5);
}

#[tokio::test]
async fn source_split_holds_with_many_terms() {
    let twitter_server = MockServer::start().await;
    let reddit_server = MockServer::start().await;
    mount_twitter(&twitter_server, 10).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(&reddit_server)
        .await;
    // Five items per source over three terms leaves one item per term.
    Mock::given(method("GET"))
        .and(path("/r/all/search"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts(8)))
        .expect(3)
        .mount(&reddit_server)
        .await;

    let pipeline = Pipeline::Live {
        twitter: twitter(&twitter_server),
        reddit: reddit(&reddit_server),
        classifier: Classifier::lexicon(),
    };
    let h = harness(pipeline, options(), &["a", "b", "c"], 10);

    h.collector.run_cycle().await;
    let snap = h.aggregator.snapshot();
    assert!(snap.sources.twitter <= 5, "twitter got {}", snap.sources.twitter);
    assert!(snap.sources.reddit <= 5, "reddit got {}", snap.sources.reddit);
    assert_eq!(snap.sources.twitter, 3);
    assert_eq!(snap.sources.reddit, 3);
}

#[tokio::test]
async fn low_memory_cycle_cap_limits_live_collection() {
    let twitter_server = MockServer::start().await;
    let reddit_server = MockServer::start().await;
    mount_twitter(&twitter_server, 30).await;
    mount_reddit(&reddit_server, "10", 30).await;

    let pipeline = Pipeline::Live {
        twitter: twitter(&twitter_server),
        reddit: reddit(&reddit_server),
        classifier: Classifier::lexicon(),
    };
    let opts = CollectorOptions {
        live_cycle_cap: Some(20),
        ..options()
    };
    let h = harness(pipeline, opts, &["rust"], 100);

    assert_eq!(h.collector.run_cycle().await.collected, 20);
}

#[tokio::test]
async fn disabled_source_contributes_nothing() {
    let reddit_server = MockServer::start().await;
    mount_reddit(&reddit_server, "5", 2).await;

    let pipeline = Pipeline::Live {
        twitter: SourceFetcher::Disabled(Source::Twitter),
        reddit: reddit(&reddit_server),
        classifier: Classifier::lexicon(),
    };
    let h = harness(pipeline, options(), &["rust"], 10);

    h.collector.run_cycle().await;
    let snap = h.aggregator.snapshot();
    assert_eq!(snap.sources.twitter, 0);
    assert_eq!(snap.sources.reddit, 2);
}

#[tokio::test]
async fn demo_cycles_always_produce_labelled_items() {
    let pipeline = Pipeline::Demo {
        classifier: Classifier::lexicon(),
    };
    let h = harness(pipeline, options(), &["python"], 100);

    for round in 1..=3u64 {
        let report = h.collector.run_cycle().await;
        assert_eq!(report, CycleReport { collected: 10, merged: true });
        assert_eq!(h.aggregator.snapshot().total(), 10 * round);
    }

    let snap = h.aggregator.snapshot();
    assert_eq!(snap.recent_items.len(), 30);
    assert!(snap
        .recent_items
        .iter()
        .all(|item| Sentiment::ALL.contains(&item.sentiment)));
    assert_eq!(snap.sources.twitter + snap.sources.reddit, 30);
}

#[tokio::test]
async fn degraded_cycle_runs_without_classifier() {
    let pipeline = Pipeline::Degraded {
        reason: "model client failed".to_string(),
    };
    assert_eq!(pipeline.init_error(), Some("model client failed"));
    let opts = CollectorOptions {
        sample_count: 5,
        ..options()
    };
    let h = harness(pipeline, opts, &["python"], 100);

    let report = h.collector.run_cycle().await;
    assert_eq!(report.collected, 5);
    assert_eq!(h.aggregator.snapshot().total(), 5);
    assert_eq!(h.collector.interval(), Duration::from_secs(10));
}

#[tokio::test]
async fn reset_during_cycle_discards_stale_batch() {
    let twitter_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(tweets(3))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&twitter_server)
        .await;

    let pipeline = Pipeline::Live {
        twitter: twitter(&twitter_server),
        reddit: SourceFetcher::Disabled(Source::Reddit),
        classifier: Classifier::lexicon(),
    };
    let h = harness(pipeline, options(), &["rust"], 10);

    let (report, ()) = tokio::join!(h.collector.run_cycle(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.aggregator.reset();
    });

    assert_eq!(report, CycleReport { collected: 3, merged: false });
    assert_eq!(h.aggregator.snapshot().total(), 0);

    // The next cycle runs under the new generation and merges normally.
    assert!(h.collector.run_cycle().await.merged);
    assert_eq!(h.aggregator.snapshot().total(), 3);
}

#[tokio::test]
async fn wake_signal_is_consumed_exactly_once() {
    let h = harness(
        Pipeline::Demo {
            classifier: Classifier::lexicon(),
        },
        options(),
        &["python"],
        10,
    );

    // Fired while nobody waits: the next wait returns at once.
    h.wake.notify_one();
    let reason = tokio::time::timeout(
        Duration::from_secs(1),
        h.collector.wait_for_next_cycle(Duration::from_secs(60)),
    )
    .await
    .expect("signaled wait should return immediately");
    assert_eq!(reason, WakeReason::Signaled);

    let reason = h
        .collector
        .wait_for_next_cycle(Duration::from_millis(20))
        .await;
    assert_eq!(reason, WakeReason::Timer);
}

#[tokio::test]
async fn low_memory_releases_model_after_cycle() {
    let model_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"model_id": "sst2"})))
        .expect(1)
        .mount(&model_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "POSITIVE", "score": 0.9},
            {"label": "NEGATIVE", "score": 0.1}
        ])))
        .mount(&model_server)
        .await;

    let pipeline = Pipeline::Demo {
        classifier: Classifier::with_model(&model_server.uri(), 5).unwrap(),
    };
    let opts = CollectorOptions {
        sample_count: 3,
        release_after_cycle: true,
        ..options()
    };
    let h = harness(pipeline, opts, &["python"], 10);

    h.collector.run_cycle().await;
    assert_eq!(h.aggregator.snapshot().positive, 3);

    let Pipeline::Demo {
        classifier: Classifier::Model(model),
    } = &h.collector.pipeline
    else {
        panic!("expected model-backed demo pipeline");
    };
    assert!(!model.is_loaded().await);
}

#[tokio::test]
async fn guarded_turns_panic_into_error() {
    let result = guarded(async {
        if Duration::ZERO.is_zero() {
            panic!("merge exploded");
        }
        1
    })
    .await;
    match result {
        Err(CycleError::Panicked(message)) => assert_eq!(message, "merge exploded"),
        Ok(v) => panic!("expected panic, got {v}"),
    }

    assert_eq!(guarded(async { 7 }).await.unwrap(), 7);
}

fn app_config() -> AppConfig {
    AppConfig {
        env: Environment::Test,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "info".to_string(),
        search_terms: vec!["python".to_string()],
        max_items: 100,
        low_memory: false,
        cors_origins: CorsOrigins::Any,
        max_stored: 100,
        demo_interval_secs: 10,
        live_interval_secs: 60,
        error_cooldown_secs: 10,
        request_timeout_secs: 5,
        inter_request_delay_ms: 0,
        user_agent: "sentiboard-test/0.1".to_string(),
        sentiment_model_url: None,
        twitter_bearer_token: None,
        reddit_client_id: None,
        reddit_client_secret: None,
        reddit_user_agent: "sentiboard-test/0.1".to_string(),
    }
}

#[test]
fn pipeline_mode_follows_credentials() {
    let demo = Pipeline::from_config(&app_config()).unwrap();
    assert_eq!(demo.mode(), Mode::Demo);
    assert!(demo.init_error().is_none());

    let half_reddit = AppConfig {
        reddit_client_id: Some("id".to_string()),
        ..app_config()
    };
    assert_eq!(Pipeline::from_config(&half_reddit).unwrap().mode(), Mode::Demo);

    let live = AppConfig {
        twitter_bearer_token: Some("token".to_string()),
        ..app_config()
    };
    assert_eq!(Pipeline::from_config(&live).unwrap().mode(), Mode::Live);
}

#[test]
fn invalid_model_url_fails_construction() {
    let config = AppConfig {
        sentiment_model_url: Some("not a url".to_string()),
        ..app_config()
    };
    assert!(Pipeline::from_config(&config).is_err());

    // Low-memory never builds the model client, so the bad URL is ignored.
    let low_memory = AppConfig {
        low_memory: true,
        ..config
    };
    assert!(Pipeline::from_config(&low_memory).is_ok());
}

#[test]
fn options_follow_profile() {
    let config = AppConfig {
        low_memory: true,
        ..app_config()
    };
    let opts = CollectorOptions::from_config(&config);
    assert_eq!(opts.sample_count, 5);
    assert_eq!(opts.live_cycle_cap, Some(20));
    assert!(opts.release_after_cycle);
}
