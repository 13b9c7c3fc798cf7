use std::path::PathBuf;

use hf_hub::api::tokio::{Api, ApiRepo};

/// Download the model config and weights from Hugging Face Hub.
/// If a file exists in the cache, it will not be downloaded again.
pub async fn download_hf_model(model_name: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
    let repo = model_repo(model_name)?;

    let model_filepath = repo.get("model.safetensors").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} weights with name: model.safetensors from HuggingFace Hub: {}",
            model_name,
            e
        )
    })?;

    let config_filepath = download_hf_config(&repo, model_name).await?;

    Ok((config_filepath, model_filepath))
}

/// Download only the model config from Hugging Face Hub, for when the weights come from elsewhere
pub async fn download_hf_model_config(model_name: &str) -> anyhow::Result<PathBuf> {
    let repo = model_repo(model_name)?;

    download_hf_config(&repo, model_name).await
}

fn model_repo(model_name: &str) -> anyhow::Result<ApiRepo> {
    let api = Api::new().map_err(|e| anyhow!("Unable to reach HuggingFace Hub: {}", e))?;

    Ok(api.model(model_name.to_string()))
}

async fn download_hf_config(repo: &ApiRepo, model_name: &str) -> anyhow::Result<PathBuf> {
    repo.get("config.json").await.map_err(|e| {
        anyhow!(
            "Failed to download: {} config with name: config.json from HuggingFace Hub: {}",
            model_name,
            e
        )
    })
}
