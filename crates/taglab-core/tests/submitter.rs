use std::time::Duration;
use taglab_core::config::{DataPaths, FileNames};
use taglab_core::errors::{JobTerminalError, PollError, PreconditionError};
use taglab_core::finetune::{load_job_record, resumable_job_id, FineTuneSubmitter, SubmitSettings};
use taglab_core::model::JobStatus;
use taglab_core::pacing::{CancelFlag, PollPolicy};
use taglab_core::providers::finetune::fake::{snapshot, FakeCall, FakeFineTuneApi};
use taglab_core::providers::finetune::JobSnapshot;
use tempfile::TempDir;

fn setup(with_training_file: bool) -> (TempDir, DataPaths) {
    let dir = TempDir::new().unwrap();
    let paths = DataPaths::in_dir(dir.path().to_path_buf(), &FileNames::default());
    if with_training_file {
        std::fs::write(
            &paths.fine_tune,
            "{\"messages\":[]}\n{\"messages\":[]}\n",
        )
        .unwrap();
    }
    (dir, paths)
}

fn settings() -> SubmitSettings {
    let fast = PollPolicy::new(Duration::from_millis(1), Some(Duration::from_secs(5)));
    SubmitSettings {
        base_model: "gpt-3.5-turbo-0125".into(),
        suffix: "ecd-eye".into(),
        epochs: 3,
        file_poll: fast,
        job_poll: fast,
    }
}

fn submitter(api: &FakeFineTuneApi) -> FineTuneSubmitter<'_> {
    FineTuneSubmitter {
        api,
        settings: settings(),
        cancel: CancelFlag::new(),
    }
}

#[tokio::test]
async fn test_success_writes_job_and_model_ids() {
    let (_dir, paths) = setup(true);
    let api = FakeFineTuneApi::succeeding("ft:gpt-3.5:taglab::abc");

    let job = submitter(&api).submit(&paths).await.unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(
        std::fs::read_to_string(&paths.job_id).unwrap().trim(),
        "ftjob-fake-1"
    );
    assert_eq!(
        std::fs::read_to_string(&paths.model_id).unwrap().trim(),
        "ft:gpt-3.5:taglab::abc"
    );

    let record = load_job_record(&paths.job_record).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Succeeded);
    assert_eq!(record.file_id, "file-fake-1");
    assert_eq!(record.training_file_sha256.len(), 64);

    let calls = api.calls();
    assert!(matches!(
        &calls[0],
        FakeCall::Upload { purpose, .. } if purpose == "fine-tune"
    ));
    // the file was polled until processed before the job was created
    let create_at = calls
        .iter()
        .position(|c| matches!(c, FakeCall::CreateJob(_)))
        .unwrap();
    assert_eq!(
        calls[1..create_at]
            .iter()
            .filter(|c| matches!(c, FakeCall::FileStatus(_)))
            .count(),
        2
    );
    match &calls[create_at] {
        FakeCall::CreateJob(req) => {
            assert_eq!(req.training_file_id, "file-fake-1");
            assert_eq!(req.suffix, "ecd-eye");
            assert_eq!(req.epochs, 3);
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_job_keeps_job_id_and_writes_no_model() {
    let (_dir, paths) = setup(true);
    let api = FakeFineTuneApi::new(
        ["processed"],
        [
            snapshot(JobStatus::Running),
            JobSnapshot {
                status: JobStatus::Failed,
                fine_tuned_model: None,
                error: Some("invalid training file (invalid_file_format)".into()),
            },
        ],
    );

    let err = submitter(&api).submit(&paths).await.unwrap_err();
    let term = err.downcast_ref::<JobTerminalError>().unwrap();
    assert_eq!(term.status, JobStatus::Failed);
    assert!(err.to_string().contains("invalid_file_format"));

    assert!(paths.job_id.exists());
    assert!(!paths.model_id.exists());
    let record = load_job_record(&paths.job_record).unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert_eq!(
        record.error.as_deref(),
        Some("invalid training file (invalid_file_format)")
    );
}

#[tokio::test]
async fn test_cancelled_job_is_terminal() {
    let (_dir, paths) = setup(true);
    let api = FakeFineTuneApi::new(["processed"], [snapshot(JobStatus::Cancelled)]);
    let err = submitter(&api).submit(&paths).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<JobTerminalError>().unwrap().status,
        JobStatus::Cancelled
    );
    assert!(!paths.model_id.exists());
}

#[tokio::test]
async fn test_missing_training_file_makes_no_calls() {
    let (_dir, paths) = setup(false);
    let api = FakeFineTuneApi::succeeding("unused");
    let err = submitter(&api).submit(&paths).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PreconditionError>(),
        Some(PreconditionError::MissingFineTuneFile(_))
    ));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_create_failure_writes_no_job_id() {
    let (_dir, paths) = setup(true);
    let api = FakeFineTuneApi::succeeding("unused").failing_create();
    let err = submitter(&api).submit(&paths).await.unwrap_err();
    assert!(format!("{:#}", err).contains("model not available"));
    assert!(!paths.job_id.exists());
}

#[tokio::test]
async fn test_cancel_flag_stops_polling() {
    let (_dir, paths) = setup(true);
    let api = FakeFineTuneApi::new(["uploaded"], [snapshot(JobStatus::Running)]);
    let s = submitter(&api);
    s.cancel.cancel();

    let err = s.submit(&paths).await.unwrap_err();
    assert!(matches!(
        err.chain().find_map(|c| c.downcast_ref::<PollError>()),
        Some(PollError::Cancelled { .. })
    ));
    assert!(!paths.job_id.exists());
}

#[tokio::test]
async fn test_job_poll_times_out() {
    let (_dir, paths) = setup(true);
    let api = FakeFineTuneApi::new(["processed"], [snapshot(JobStatus::Running)]);
    let mut s = submitter(&api);
    s.settings.job_poll = PollPolicy::new(Duration::from_millis(2), Some(Duration::from_millis(10)));

    let err = s.submit(&paths).await.unwrap_err();
    assert!(matches!(
        err.chain().find_map(|c| c.downcast_ref::<PollError>()),
        Some(PollError::TimedOut { .. })
    ));
    // the job reference survives for --resume
    assert_eq!(
        resumable_job_id(&paths).unwrap().as_deref(),
        Some("ftjob-fake-1")
    );
}

#[tokio::test]
async fn test_file_poll_timeout_clears_earlier_ids() {
    let (_dir, paths) = setup(true);
    std::fs::write(&paths.job_id, "ftjob-OLD\n").unwrap();
    std::fs::write(&paths.model_id, "ft:old-model\n").unwrap();
    let api = FakeFineTuneApi::new(["uploaded"], [snapshot(JobStatus::Running)]);
    let mut s = submitter(&api);
    s.settings.file_poll = PollPolicy::new(Duration::from_millis(2), Some(Duration::from_millis(10)));

    let err = s.submit(&paths).await.unwrap_err();
    assert!(matches!(
        err.chain().find_map(|c| c.downcast_ref::<PollError>()),
        Some(PollError::TimedOut { .. })
    ));
    assert!(!paths.job_id.exists());
    assert!(!paths.model_id.exists());
    let record = load_job_record(&paths.job_record).unwrap().unwrap();
    assert_eq!(record.job_id, None);
    assert_eq!(resumable_job_id(&paths).unwrap(), None);
}

#[tokio::test]
async fn test_resume_follows_existing_job() {
    let (_dir, paths) = setup(false);
    std::fs::write(&paths.job_id, "ftjob-earlier\n").unwrap();
    let api = FakeFineTuneApi::new(
        ["processed"],
        [
            snapshot(JobStatus::Running),
            JobSnapshot {
                status: JobStatus::Succeeded,
                fine_tuned_model: Some("ft:resumed".into()),
                error: None,
            },
        ],
    );

    let job = submitter(&api).resume(&paths).await.unwrap();
    assert_eq!(job.job_id.as_deref(), Some("ftjob-earlier"));
    assert_eq!(
        std::fs::read_to_string(&paths.model_id).unwrap().trim(),
        "ft:resumed"
    );
    assert!(api
        .calls()
        .iter()
        .all(|c| matches!(c, FakeCall::JobStatus(id) if id == "ftjob-earlier")));
}
