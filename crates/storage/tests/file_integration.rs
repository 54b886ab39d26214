use storage::Storage;
use storage::file::{ENTITLEMENTS_FILE, SCORES_FILE};
use storage::repository::{EntitlementRepository, ScoreHistoryRepository, StorageError};
use storage::file::FileRepository;
use trivia_core::model::{BookStatus, Entitlements, ScoreHistory};

#[tokio::test]
async fn file_roundtrip_persists_entitlements_and_scores() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let storage = Storage::files(tmp.path()).await.expect("open");

    let mut ent = Entitlements::default();
    ent.set(2, BookStatus::Active).unwrap();
    ent.set(5, BookStatus::Inactive).unwrap();
    storage.entitlements.save_entitlements(&ent).await.unwrap();
    storage
        .scores
        .save_scores(&ScoreHistory::from_scores([12, -3, 5]))
        .await
        .unwrap();

    // A fresh handle on the same directory sees the saved state.
    let reopened = Storage::files(tmp.path()).await.expect("reopen");
    assert_eq!(reopened.entitlements.load_entitlements().await.unwrap(), Some(ent));
    assert_eq!(
        reopened.scores.load_scores().await.unwrap(),
        Some(ScoreHistory::from_scores([12, -3, 5]))
    );
}

#[tokio::test]
async fn files_are_plain_json_arrays() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = FileRepository::open(tmp.path()).await.expect("open");
    repo.save_entitlements(&Entitlements::default()).await.unwrap();
    repo.save_scores(&ScoreHistory::from_scores([1, 2, 3]))
        .await
        .unwrap();

    let ent = std::fs::read_to_string(tmp.path().join(ENTITLEMENTS_FILE)).unwrap();
    assert_eq!(
        ent,
        r#"["active","active","inactive","locked","locked","locked","locked"]"#
    );
    let scores = std::fs::read_to_string(tmp.path().join(SCORES_FILE)).unwrap();
    assert_eq!(scores, "[1,2,3]");
}

#[tokio::test]
async fn missing_files_load_as_none() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let repo = FileRepository::open(tmp.path()).await.expect("open");
    assert!(repo.load_entitlements().await.unwrap().is_none());
    assert!(repo.load_scores().await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_files_are_parse_errors() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(tmp.path().join(ENTITLEMENTS_FILE), b"[\"active\", \"bogus\"]").unwrap();
    std::fs::write(tmp.path().join(SCORES_FILE), b"not json").unwrap();
    let repo = FileRepository::open(tmp.path()).await.expect("open");

    assert!(matches!(
        repo.load_entitlements().await,
        Err(StorageError::Parse(_))
    ));
    assert!(matches!(repo.load_scores().await, Err(StorageError::Parse(_))));
}
