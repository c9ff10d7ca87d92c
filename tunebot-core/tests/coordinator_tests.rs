// File: tunebot-core/tests/coordinator_tests.rs

mod test_utils;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use tempfile::TempDir;

use tunebot_common::models::{DownloadTarget, RequestOutcome, SearchHit};
use tunebot_common::traits::{MediaDownloader, VideoSearch};
use tunebot_core::Error;
use tunebot_core::coordinator::files::{AUDIO_EXTENSION, DownloadDir};
use tunebot_core::coordinator::messages::Locale;
use tunebot_core::coordinator::{RequestCoordinator, SEARCH_RESULT_LIMIT};

use test_utils::{FakeVoice, PlayBehavior, RecordingRequester, files_in};

mock! {
    Search {}
    #[async_trait]
    impl VideoSearch for Search {
        async fn search(&self, query: &str, max_results: u32) -> Result<Option<SearchHit>, Error>;
    }
}

mock! {
    Downloader {}
    #[async_trait]
    impl MediaDownloader for Downloader {
        async fn download(&self, url: &str, target: &DownloadTarget) -> Result<PathBuf, Error>;
    }
}

const LINK: &str = "https://www.youtube.com/watch?v=abc123";

/// Writes a fake mp3 where yt-dlp would have put it.
fn write_fake_audio(target: &DownloadTarget) -> Result<PathBuf, Error> {
    let path = target.expected_path(AUDIO_EXTENSION);
    std::fs::write(&path, b"ID3 fake audio")?;
    Ok(path)
}

fn downloader_expecting(url: &'static str) -> MockDownloader {
    let mut downloader = MockDownloader::new();
    downloader
        .expect_download()
        .with(eq(url), mockall::predicate::always())
        .times(1)
        .returning(|_, target| write_fake_audio(target));
    downloader
}

fn search_never_called() -> MockSearch {
    let mut search = MockSearch::new();
    search.expect_search().times(0);
    search
}

fn coordinator(
    search: MockSearch,
    downloader: MockDownloader,
    voice: Arc<FakeVoice>,
    dir: &TempDir,
) -> RequestCoordinator {
    RequestCoordinator::new(
        Arc::new(search),
        Arc::new(downloader),
        voice,
        DownloadDir::new(dir.path().join("downloads")),
        Locale::En,
    )
}

#[tokio::test]
async fn direct_link_plays_to_completion_and_cleans_up() {
    let tmp = TempDir::new().unwrap();
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search_never_called(), downloader_expecting(LINK), voice.clone(), &tmp);
    let requester = RecordingRequester::in_voice();

    let outcome = coord.handle_request(LINK, &requester).await;

    assert_eq!(outcome, RequestOutcome::Completed);
    assert_eq!(voice.joins(), 1);
    assert_eq!(voice.closes(), 1);
    assert_eq!(*voice.log.file_present_at_play.lock().unwrap(), vec![true]);
    // File goes first, then the session.
    assert_eq!(*voice.log.file_present_at_close.lock().unwrap(), vec![false]);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);

    let replies = requester.replies();
    assert_eq!(replies, vec![Locale::En.playing_link(LINK), Locale::En.finished(LINK)]);
}

#[tokio::test]
async fn free_text_is_resolved_with_a_single_result_search() {
    let tmp = TempDir::new().unwrap();
    let mut search = MockSearch::new();
    search
        .expect_search()
        .with(eq("lofi hip hop radio"), eq(SEARCH_RESULT_LIMIT))
        .times(1)
        .returning(|_, _| {
            Ok(Some(SearchHit {
                title: "Lofi Hip Hop Radio".into(),
                url: "https://www.youtube.com/watch?v=lofi".into(),
            }))
        });
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(
        search,
        downloader_expecting("https://www.youtube.com/watch?v=lofi"),
        voice.clone(),
        &tmp,
    );
    let requester = RecordingRequester::in_voice();

    let outcome = coord.handle_request("  lofi hip hop radio ", &requester).await;

    assert_eq!(SEARCH_RESULT_LIMIT, 1);
    assert_eq!(outcome, RequestOutcome::Completed);
    assert_eq!(
        requester.replies(),
        vec![
            Locale::En.found_video("Lofi Hip Hop Radio"),
            Locale::En.finished("Lofi Hip Hop Radio"),
        ]
    );
}

#[tokio::test]
async fn no_search_results_ends_without_download() {
    let tmp = TempDir::new().unwrap();
    let mut search = MockSearch::new();
    search
        .expect_search()
        .with(eq("some obscure song title xyz"), eq(1u32))
        .times(1)
        .returning(|_, _| Ok(None));
    let mut downloader = MockDownloader::new();
    downloader.expect_download().times(0);
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search, downloader, voice.clone(), &tmp);
    let requester = RecordingRequester::in_voice();

    let outcome = coord.handle_request("some obscure song title xyz", &requester).await;

    assert_eq!(outcome, RequestOutcome::NotFound);
    assert_eq!(requester.replies(), vec![Locale::En.not_found()]);
    assert_eq!(voice.joins(), 0);
}

#[tokio::test]
async fn search_fault_is_reported_generically() {
    let tmp = TempDir::new().unwrap();
    let mut search = MockSearch::new();
    search
        .expect_search()
        .times(1)
        .returning(|_, _| Err(Error::Search("HTTP 403 => quotaExceeded".into())));
    let mut downloader = MockDownloader::new();
    downloader.expect_download().times(0);
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search, downloader, voice.clone(), &tmp);
    let requester = RecordingRequester::in_voice();

    let outcome = coord.handle_request("anything", &requester).await;

    assert_eq!(outcome, RequestOutcome::SearchFailed);
    let replies = requester.replies();
    assert_eq!(replies, vec![Locale::En.search_error()]);
    assert!(!replies[0].contains("quotaExceeded"));
}

#[tokio::test]
async fn requester_outside_voice_gets_notice_and_file_is_removed() {
    let tmp = TempDir::new().unwrap();
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search_never_called(), downloader_expecting(LINK), voice.clone(), &tmp);
    let requester = RecordingRequester::not_in_voice();

    let outcome = coord.handle_request(LINK, &requester).await;

    assert_eq!(outcome, RequestOutcome::Absent);
    assert_eq!(voice.joins(), 0);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
    assert_eq!(
        requester.replies(),
        vec![Locale::En.playing_link(LINK), Locale::En.join_voice_first()]
    );
}

#[tokio::test]
async fn requests_outside_a_guild_never_join_voice() {
    let tmp = TempDir::new().unwrap();
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search_never_called(), downloader_expecting(LINK), voice.clone(), &tmp);
    let requester = RecordingRequester {
        guild_id: None,
        ..RecordingRequester::in_voice()
    };

    let outcome = coord.handle_request(LINK, &requester).await;

    assert_eq!(outcome, RequestOutcome::Absent);
    assert_eq!(voice.joins(), 0);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
}

#[tokio::test]
async fn presence_lookup_fault_removes_file_without_joining() {
    let tmp = TempDir::new().unwrap();
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search_never_called(), downloader_expecting(LINK), voice.clone(), &tmp);
    let requester = RecordingRequester {
        presence_fails: true,
        ..RecordingRequester::in_voice()
    };

    let outcome = coord.handle_request(LINK, &requester).await;

    assert_eq!(outcome, RequestOutcome::Errored);
    assert_eq!(voice.joins(), 0);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
    assert_eq!(requester.replies().last().unwrap(), &Locale::En.playback_error());
}

#[tokio::test]
async fn download_fault_creates_no_session_and_leaves_no_partial() {
    let tmp = TempDir::new().unwrap();
    let mut downloader = MockDownloader::new();
    downloader.expect_download().times(1).returning(|_, target| {
        std::fs::write(target.dir.join(format!("{}.webm.part", target.stem)), b"half")?;
        Err(Error::Download("ERROR: [youtube] abc123: Video unavailable".into()))
    });
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search_never_called(), downloader, voice.clone(), &tmp);
    let requester = RecordingRequester::in_voice();

    let outcome = coord.handle_request(LINK, &requester).await;

    assert_eq!(outcome, RequestOutcome::DownloadFailed);
    assert_eq!(voice.joins(), 0);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
    let replies = requester.replies();
    assert_eq!(replies, vec![Locale::En.playing_link(LINK), Locale::En.download_error()]);
    assert!(replies.iter().all(|r| !r.contains("Video unavailable")));
}

#[tokio::test]
async fn failed_join_still_removes_file() {
    let tmp = TempDir::new().unwrap();
    let voice = Arc::new(FakeVoice::failing_join());
    let coord = coordinator(search_never_called(), downloader_expecting(LINK), voice.clone(), &tmp);
    let requester = RecordingRequester::in_voice();

    let outcome = coord.handle_request(LINK, &requester).await;

    assert_eq!(outcome, RequestOutcome::Errored);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
    assert_eq!(requester.replies().last().unwrap(), &Locale::En.playback_error());
}

#[tokio::test]
async fn playback_failures_clean_up_file_and_session() {
    for behavior in [PlayBehavior::Fail, PlayBehavior::Refuse, PlayBehavior::DropSignal] {
        let tmp = TempDir::new().unwrap();
        let voice = Arc::new(FakeVoice::new(behavior));
        let coord = coordinator(search_never_called(), downloader_expecting(LINK), voice.clone(), &tmp);
        let requester = RecordingRequester::in_voice();

        let outcome = coord.handle_request(LINK, &requester).await;

        assert_eq!(outcome, RequestOutcome::Errored, "{behavior:?}");
        assert_eq!(voice.joins(), 1, "{behavior:?}");
        assert_eq!(voice.closes(), 1, "{behavior:?}");
        assert_eq!(files_in(&tmp.path().join("downloads")), 0, "{behavior:?}");
        assert_eq!(
            requester.replies(),
            vec![Locale::En.playing_link(LINK), Locale::En.playback_error()],
            "{behavior:?}"
        );
    }
}

#[tokio::test]
async fn concurrent_requests_use_distinct_files() {
    let tmp = TempDir::new().unwrap();
    let targets: Arc<Mutex<Vec<PathBuf>>> = Arc::new(Mutex::new(Vec::new()));

    let mut downloader = MockDownloader::new();
    let seen = targets.clone();
    downloader.expect_download().times(2).returning(move |_, target| {
        let path = write_fake_audio(target)?;
        seen.lock().unwrap().push(path.clone());
        Ok(path)
    });
    let mut search = MockSearch::new();
    search.expect_search().times(2).returning(|query, _| {
        Ok(Some(SearchHit {
            title: query.to_string(),
            url: format!("https://youtu.be/{}", query.replace(' ', "-")),
        }))
    });
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search, downloader, voice.clone(), &tmp);
    let first = RecordingRequester::in_voice();
    let second = RecordingRequester::in_voice();

    let (a, b) = tokio::join!(
        coord.handle_request("first song", &first),
        coord.handle_request("second song", &second),
    );

    assert_eq!((a, b), (RequestOutcome::Completed, RequestOutcome::Completed));
    let targets = targets.lock().unwrap().clone();
    assert_eq!(targets.len(), 2);
    assert_ne!(targets[0], targets[1]);
    assert_eq!(voice.joins(), 2);
    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
}

#[tokio::test]
async fn many_lifecycles_leak_nothing() {
    let tmp = TempDir::new().unwrap();
    let mut downloader = MockDownloader::new();
    downloader.expect_download().times(6).returning(|_, target| write_fake_audio(target));
    let voice = Arc::new(FakeVoice::new(PlayBehavior::Finish));
    let coord = coordinator(search_never_called(), downloader, voice.clone(), &tmp);

    for round in 0..6 {
        let requester = if round % 2 == 0 {
            RecordingRequester::in_voice()
        } else {
            RecordingRequester::not_in_voice()
        };
        coord.handle_request(LINK, &requester).await;
        assert_eq!(requester.replies().len(), 2, "round {round}");
    }

    assert_eq!(files_in(&tmp.path().join("downloads")), 0);
    assert_eq!(voice.joins(), 3);
    assert_eq!(voice.closes(), 3);
}
