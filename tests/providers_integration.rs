mod common;

use std::fs;
use std::sync::atomic::Ordering;

use common::{FakeUpstream, names, spawn_upstream, test_config};
use tempfile::tempdir;
use usb_photo_frame::config::ProviderKind;
use usb_photo_frame::http::build_client;
use usb_photo_frame::model::StagedImage;
use usb_photo_frame::providers::{self, ImageProvider};

fn provider(cfg: &usb_photo_frame::config::Configuration) -> Box<dyn ImageProvider> {
    let client = build_client(cfg.http_timeout).unwrap();
    providers::select(cfg, client)
}

fn file_names(images: &[StagedImage]) -> Vec<&str> {
    images.iter().map(|img| img.name.as_str()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn bing_stages_at_most_image_count_resized_files() {
    let upstream = FakeUpstream::new();
    upstream.set_bing(&["OHR.A", "OHR.B", "OHR.C", "OHR.D", "OHR.E"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Bing);

    let images = provider(&cfg).get_images().await.unwrap();

    assert_eq!(file_names(&images), vec!["OHR.A.jpg", "OHR.B.jpg", "OHR.C.jpg"]);
    for img in &images {
        assert!(img.path.is_file());
        let decoded = image::open(&img.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 48));
    }
    assert_eq!(images[0].attribution.as_deref(), Some("OHR.A (c) Someone"));
    assert!(upstream.requests().contains(&"manifest:bing:n=3".to_string()));
    assert!(tmp.path().join("state/lastiodbing.json").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_cache_files_are_removed() {
    let upstream = FakeUpstream::new();
    upstream.set_bing(&["OHR.A", "OHR.B"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Bing);
    let cache = tmp.path().join("img/bing");
    fs::create_dir_all(&cache).unwrap();
    for stale in ["OHR.OLD1.jpg", "OHR.OLD2.jpg", "notes.txt"] {
        fs::write(cache.join(stale), b"x").unwrap();
    }

    let images = provider(&cfg).get_images().await.unwrap();

    assert_eq!(names(&cache), vec!["OHR.A.jpg", "OHR.B.jpg"]);
    assert_eq!(images.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cached_files_are_not_downloaded_again() {
    let upstream = FakeUpstream::new();
    upstream.set_bing(&["OHR.A", "OHR.B"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Bing);
    let bing = provider(&cfg);

    bing.get_images().await.unwrap();
    upstream.clear_requests();
    let again = bing.get_images().await.unwrap();

    assert_eq!(file_names(&again), vec!["OHR.A.jpg", "OHR.B.jpg"]);
    assert_eq!(upstream.requests(), vec!["manifest:bing:n=3".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn manifest_failure_serves_the_last_snapshot() {
    let upstream = FakeUpstream::new();
    upstream.set_bing(&["OHR.A", "OHR.B", "OHR.C"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Bing);
    let bing = provider(&cfg);
    let first = bing.get_images().await.unwrap();

    upstream.manifests_down.store(true, Ordering::SeqCst);
    upstream.clear_requests();
    let fallback = bing.get_images().await.unwrap();

    assert_eq!(fallback, first);
    assert_eq!(upstream.requests(), vec!["manifest:bing:n=3".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshot_entries_without_files_are_dropped() {
    let upstream = FakeUpstream::new();
    upstream.set_bing(&["OHR.A", "OHR.B"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Bing);
    let bing = provider(&cfg);
    let first = bing.get_images().await.unwrap();
    fs::remove_file(&first[0].path).unwrap();

    upstream.manifests_down.store(true, Ordering::SeqCst);
    let fallback = bing.get_images().await.unwrap();

    assert_eq!(file_names(&fallback), vec!["OHR.B.jpg"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn manifest_failure_without_snapshot_is_empty() {
    let upstream = FakeUpstream::new();
    upstream.manifests_down.store(true, Ordering::SeqCst);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Natgeo);

    let images = provider(&cfg).get_images().await.unwrap();

    assert!(images.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn undecodable_entry_is_discarded_without_failing_the_batch() {
    let upstream = FakeUpstream::new();
    upstream.set_bing(&["OHR.A", "OHR.B", "OHR.C", "OHR.D"]);
    upstream.corrupt("OHR.B");
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Bing);

    let images = provider(&cfg).get_images().await.unwrap();

    assert_eq!(file_names(&images), vec!["OHR.A.jpg", "OHR.C.jpg", "OHR.D.jpg"]);
    assert_eq!(
        names(&tmp.path().join("img/bing")),
        vec!["OHR.A.jpg", "OHR.C.jpg", "OHR.D.jpg"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn natgeo_fetches_the_previous_page_when_short() {
    let upstream = FakeUpstream::new();
    upstream.set_natgeo(&["a.jpg"], &["b.jpg", "c.jpg", "d.jpg"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Natgeo);

    let images = provider(&cfg).get_images().await.unwrap();

    assert_eq!(file_names(&images), vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert_eq!(images[1].attribution.as_deref(), Some("Title b.jpg - Photographer"));
    assert!(upstream.requests().contains(&"manifest:natgeo-previous".to_string()));
    assert!(tmp.path().join("state/lastnatgeo.json").is_file());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn natgeo_skips_paging_when_the_first_page_is_enough() {
    let upstream = FakeUpstream::new();
    upstream.set_natgeo(&["a.jpg", "b.jpg", "c.jpg"], &["d.jpg"]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Natgeo);

    provider(&cfg).get_images().await.unwrap();

    assert!(!upstream.requests().contains(&"manifest:natgeo-previous".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pexels_authenticates_and_names_files_by_id() {
    let upstream = FakeUpstream::new();
    upstream.set_pexels(&[11, 22]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Pexels);

    let images = provider(&cfg).get_images().await.unwrap();

    assert_eq!(file_names(&images), vec!["11.jpg", "22.jpg"]);
    assert_eq!(images[1].attribution.as_deref(), Some("P22"));
    assert!(upstream.requests().contains(&"manifest:pexels:per_page=3".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pexels_with_a_bad_key_falls_back() {
    let upstream = FakeUpstream::new();
    upstream.set_pexels(&[11]);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let mut cfg = test_config(tmp.path(), &base, ProviderKind::Pexels);
    cfg.endpoints.pexels_api_key = "wrong".to_string();

    let images = provider(&cfg).get_images().await.unwrap();

    assert!(images.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn picsum_downloads_fresh_images_every_call() {
    let upstream = FakeUpstream::new();
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let mut cfg = test_config(tmp.path(), &base, ProviderKind::Random);
    cfg.image_count = 2;
    let picsum = provider(&cfg);

    let first = picsum.get_images().await.unwrap();
    let second = picsum.get_images().await.unwrap();

    assert_eq!(file_names(&first), vec!["image0.jpg", "image1.jpg"]);
    assert_eq!(first, second);
    let downloads = upstream
        .requests()
        .into_iter()
        .filter(|r| r == "image:picsum:80x48")
        .count();
    assert_eq!(downloads, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn picsum_failure_is_an_error() {
    let upstream = FakeUpstream::new();
    upstream.manifests_down.store(true, Ordering::SeqCst);
    let base = spawn_upstream(upstream.clone()).await;
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), &base, ProviderKind::Random);

    assert!(provider(&cfg).get_images().await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn local_folder_uses_files_as_they_are() {
    let tmp = tempdir().unwrap();
    let cfg = test_config(tmp.path(), "http://127.0.0.1:9", ProviderKind::LocalFolder);
    fs::create_dir_all(&cfg.local_folder).unwrap();
    let original = common::jpeg_bytes(120, 90, 10);
    fs::write(cfg.local_folder.join("b.jpg"), &original).unwrap();
    fs::write(cfg.local_folder.join("a.jpg"), &original).unwrap();

    let images = provider(&cfg).get_images().await.unwrap();

    assert_eq!(file_names(&images), vec!["a.jpg", "b.jpg"]);
    assert_eq!(fs::read(&images[0].path).unwrap(), original);
}
