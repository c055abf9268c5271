//! Open/save of the custom models file against an in-memory server.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use modelsync::api::{ApiError, ModelsApi, SettingsScope};
use modelsync::config::XdgDirs;
use modelsync::models::{
    default_model_pack, CustomModel, CustomProvider, ModelPack, ModelRegistry, ModelRole,
    PlanSettings, Selector, SettingsUpdater,
};
use modelsync::sync::{
    example_template, ChangeAction, Confirm, EntityKind, ModelsFile, ModelsInput, OpenOutcome,
    SaveOutcome, SyncError, SyncSession,
};

#[derive(Default)]
struct State {
    models: Vec<CustomModel>,
    providers: Vec<CustomProvider>,
    packs: Vec<ModelPack>,
    settings: Option<PlanSettings>,
}

#[derive(Default)]
struct MemoryApi {
    state: Mutex<State>,
    creates: AtomicUsize,
    provider_lists: AtomicUsize,
    packs_unavailable: bool,
}

impl MemoryApi {
    fn store(&self, input: &ModelsInput) {
        let registry = ModelRegistry::with_custom(&input.custom_models);
        let packs = input
            .custom_model_packs
            .iter()
            .map(|p| p.to_model_pack(&registry).unwrap())
            .collect();

        let mut state = self.state.lock().unwrap();
        state.models = input
            .custom_models
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, mut m)| {
                m.id = Some(format!("model-{}", i));
                m.created_at = Some("2025-01-01T00:00:00Z".to_string());
                m
            })
            .collect();
        state.providers = input.custom_providers.clone();
        state.packs = packs;
    }

    fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelsApi for MemoryApi {
    async fn list_custom_models(&self) -> Result<Vec<CustomModel>, ApiError> {
        Ok(self.state.lock().unwrap().models.clone())
    }

    async fn list_custom_providers(&self) -> Result<Vec<CustomProvider>, ApiError> {
        self.provider_lists.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().providers.clone())
    }

    async fn list_model_packs(&self) -> Result<Vec<ModelPack>, ApiError> {
        if self.packs_unavailable {
            return Err(ApiError::Status {
                status: 500,
                message: "model packs unavailable".to_string(),
            });
        }
        Ok(self.state.lock().unwrap().packs.clone())
    }

    async fn create_custom_models(&self, input: &ModelsInput) -> Result<(), ApiError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.store(input);
        Ok(())
    }

    async fn get_settings(&self, _scope: &SettingsScope) -> Result<PlanSettings, ApiError> {
        let state = self.state.lock().unwrap();
        match &state.settings {
            Some(settings) => Ok(settings.clone()),
            None => Ok(PlanSettings::new(default_model_pack().unwrap())),
        }
    }

    async fn update_settings(
        &self,
        _scope: &SettingsScope,
        settings: &PlanSettings,
    ) -> Result<String, ApiError> {
        self.state.lock().unwrap().settings = Some(settings.clone());
        Ok("Model settings updated".to_string())
    }
}

struct Answer {
    overwrite: bool,
    asked: AtomicUsize,
}

impl Answer {
    fn new(overwrite: bool) -> Self {
        Self {
            overwrite,
            asked: AtomicUsize::new(0),
        }
    }

    fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirm for Answer {
    fn confirm_overwrite(&self, _path: &Path) -> std::io::Result<bool> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.overwrite)
    }
}

fn default_file(tmp: &TempDir) -> ModelsFile {
    ModelsFile::at_default(&XdgDirs::under(tmp.path()))
}

#[tokio::test]
async fn test_empty_server_writes_example() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let session = SyncSession::new(&api, default_file(&tmp), false);

    let outcome = session.open(&Answer::new(false)).await.unwrap();
    assert_eq!(outcome, OpenOutcome::ExampleWritten);

    let written = session.file().read().unwrap().unwrap();
    assert!(written.equals(&example_template(false)).unwrap());
    assert_eq!(api.creates(), 0);
}

#[tokio::test]
async fn test_empty_server_keeps_existing_file() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let file = default_file(&tmp);
    let mut doc = example_template(false);
    doc.custom_model_packs.clear();
    file.write(&doc).unwrap();

    let session = SyncSession::new(&api, file, false);
    let outcome = session.open(&Answer::new(true)).await.unwrap();
    assert_eq!(outcome, OpenOutcome::LocalKept);
    assert_eq!(session.file().read().unwrap().unwrap(), doc);
}

#[tokio::test]
async fn test_save_pushes_and_records_hash() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let session = SyncSession::new(&api, default_file(&tmp), false);
    session.open(&Answer::new(false)).await.unwrap();

    let SaveOutcome::Pushed(changes) = session.save().await.unwrap() else {
        panic!("expected a push");
    };
    assert_eq!(api.creates(), 1);

    let lines: Vec<(ChangeAction, EntityKind, String)> = changes
        .changes()
        .into_iter()
        .map(|c| (c.action, c.kind, c.key))
        .collect();
    assert_eq!(
        lines,
        vec![
            (ChangeAction::Added, EntityKind::Provider, "togetherai".to_string()),
            (
                ChangeAction::Added,
                EntityKind::Model,
                "meta-llama/llama-4-maverick".to_string()
            ),
            (
                ChangeAction::Added,
                EntityKind::ModelPack,
                "example-model-pack".to_string()
            ),
        ]
    );

    let local = session.file().read().unwrap().unwrap();
    assert_eq!(
        session.file().read_hash().unwrap(),
        Some(local.hash().unwrap())
    );

    // Nothing left to push, and the server copy now matches the file.
    assert_eq!(session.save().await.unwrap(), SaveOutcome::NoChanges);
    assert_eq!(api.creates(), 1);
    assert_eq!(
        session.open(&Answer::new(false)).await.unwrap(),
        OpenOutcome::Equivalent
    );
}

#[tokio::test]
async fn test_open_refreshes_from_server() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let session = SyncSession::new(&api, default_file(&tmp), false);
    session.open(&Answer::new(false)).await.unwrap();
    session.save().await.unwrap();

    // Another client drops the pack.
    let mut remote = example_template(false);
    remote.custom_model_packs.clear();
    api.store(&remote);

    let answer = Answer::new(false);
    let OpenOutcome::Refreshed(changes) = session.open(&answer).await.unwrap() else {
        panic!("expected a refresh");
    };
    assert_eq!(answer.asked(), 0);
    assert_eq!(changes.model_packs.deleted, vec!["example-model-pack".to_string()]);

    let local = session.file().read().unwrap().unwrap();
    assert!(local.custom_model_packs.is_empty());
    assert!(local.equals(&remote).unwrap());
    assert_eq!(
        session.file().read_hash().unwrap(),
        Some(local.hash().unwrap())
    );
}

#[tokio::test]
async fn test_local_edits_need_confirmation() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let session = SyncSession::new(&api, default_file(&tmp), false);
    session.open(&Answer::new(false)).await.unwrap();
    session.save().await.unwrap();

    let mut edited = session.file().read().unwrap().unwrap();
    edited.custom_models[0].base.description = "edited locally".to_string();
    session.file().write(&edited).unwrap();
    let hash_before = session.file().read_hash().unwrap();

    let decline = Answer::new(false);
    assert_eq!(session.open(&decline).await.unwrap(), OpenOutcome::Cancelled);
    assert_eq!(decline.asked(), 1);
    assert_eq!(session.file().read().unwrap().unwrap(), edited);
    assert_eq!(session.file().read_hash().unwrap(), hash_before);

    let accept = Answer::new(true);
    let outcome = session.open(&accept).await.unwrap();
    assert_eq!(accept.asked(), 1);
    let OpenOutcome::Refreshed(changes) = outcome else {
        panic!("expected a refresh");
    };
    assert_eq!(
        changes.models.updated,
        vec!["meta-llama/llama-4-maverick".to_string()]
    );
    let local = session.file().read().unwrap().unwrap();
    assert_eq!(local.custom_models[0].base.description, "Meta Llama 4 Maverick");
}

#[tokio::test]
async fn test_duplicates_rejected_before_push() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let file = default_file(&tmp);
    let mut doc = example_template(false);
    let duplicate = doc.custom_models[0].clone();
    doc.custom_models.push(duplicate);
    file.write(&doc).unwrap();

    let session = SyncSession::new(&api, file, false);
    match session.save().await {
        Err(SyncError::Validation(problems)) => {
            assert!(problems
                .iter()
                .any(|p| p.contains("duplicate model: meta-llama/llama-4-maverick")));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(api.creates(), 0);
    assert_eq!(session.file().read_hash().unwrap(), None);
}

#[tokio::test]
async fn test_save_empty_file_keeps_server_state() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    api.store(&example_template(false));
    let file = default_file(&tmp);
    file.write(&ModelsInput::default()).unwrap();

    let session = SyncSession::new(&api, file, false);
    assert_eq!(session.save().await.unwrap(), SaveOutcome::NoChanges);
    assert_eq!(api.creates(), 0);
    assert_eq!(session.file().read_hash().unwrap(), None);

    let state = api.state.lock().unwrap();
    assert_eq!(state.models.len(), 1);
    assert_eq!(state.providers.len(), 1);
    assert_eq!(state.packs.len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi {
        packs_unavailable: true,
        ..Default::default()
    };
    let session = SyncSession::new(&api, default_file(&tmp), false);

    let answer = Answer::new(true);
    assert!(matches!(
        session.open(&answer).await,
        Err(SyncError::Api(ApiError::Status { status: 500, .. }))
    ));
    assert_eq!(answer.asked(), 0);
    assert!(!session.file().path().exists());
    assert!(!session.file().hash_path().exists());

    session.file().write(&example_template(false)).unwrap();
    assert!(matches!(
        session.save().await,
        Err(SyncError::Api(ApiError::Status { status: 500, .. }))
    ));
    assert_eq!(api.creates(), 0);
    assert!(!session.file().hash_path().exists());
}

#[tokio::test]
async fn test_unknown_model_field_blocks_save() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let file = default_file(&tmp);
    let mut doc = serde_json::to_value(example_template(false)).unwrap();
    doc["customModels"][0]["maxTokenz"] = 200_000.into();
    std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
    std::fs::write(file.path(), doc.to_string()).unwrap();

    let session = SyncSession::new(&api, file, false);
    match session.save().await {
        Err(SyncError::Validation(problems)) => {
            assert_eq!(
                problems,
                vec!["customModels[0]: unknown field 'maxTokenz'".to_string()]
            );
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(api.creates(), 0);
}

#[tokio::test]
async fn test_save_without_file_fails() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let session = SyncSession::new(&api, default_file(&tmp), false);
    assert!(matches!(session.save().await, Err(SyncError::NotFound(_))));
}

#[tokio::test]
async fn test_explicit_path_has_no_sidecar() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let path = tmp.path().join("team-models.json");
    let file = ModelsFile::at(&path);
    file.write(&example_template(false)).unwrap();

    let session = SyncSession::new(&api, file, false);
    assert!(matches!(
        session.save().await.unwrap(),
        SaveOutcome::Pushed(_)
    ));
    assert!(!session.file().hash_path().exists());
}

#[tokio::test]
async fn test_cloud_skips_providers() {
    let tmp = TempDir::new().unwrap();
    let api = MemoryApi::default();
    let session = SyncSession::new(&api, default_file(&tmp), true);

    assert_eq!(
        session.open(&Answer::new(false)).await.unwrap(),
        OpenOutcome::ExampleWritten
    );
    let written = session.file().read().unwrap().unwrap();
    assert!(written.custom_providers.is_empty());

    session.save().await.unwrap();
    assert_eq!(api.provider_lists.load(Ordering::SeqCst), 0);
    assert_eq!(api.creates(), 1);
}

#[tokio::test]
async fn test_planner_switch_to_pushed_custom_model() {
    let api = MemoryApi::default();
    api.store(&example_template(false));
    let scope = SettingsScope::Plan {
        plan_id: "plan-1".to_string(),
        branch: "main".to_string(),
    };

    let settings = api.get_settings(&scope).await.unwrap();
    let updater = SettingsUpdater::with_custom(
        &api.list_custom_models().await.unwrap(),
        &api.list_model_packs().await.unwrap(),
        false,
    );
    let selector = Selector::Role {
        role: ModelRole::Planner,
        property: None,
        value: "meta-llama/llama-4-maverick".to_string(),
    };

    let updated = updater.apply(&selector, &settings).unwrap().unwrap();
    api.update_settings(&scope, &updated).await.unwrap();

    let stored = api.get_settings(&scope).await.unwrap();
    assert_eq!(
        stored.model_pack.planner.model_id.as_str(),
        "meta-llama/llama-4-maverick"
    );
    assert_eq!(
        stored.model_pack.planner.temperature,
        settings.model_pack.planner.temperature
    );
    assert!(updater.apply(&selector, &stored).unwrap().is_none());

    let pack = Selector::Pack("example-model-pack".to_string());
    let switched = updater.apply(&pack, &stored).unwrap().unwrap();
    assert_eq!(switched.model_pack.name, "example-model-pack");
}
