//! 上传文件与报告文件

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::error::{AppError, AppResult, ExtractionError, ReportError};

/// 用户选中的待上传文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    file_name: String,
    content_type: &'static str,
    bytes: Vec<u8>,
}

impl Upload {
    /// 从内存数据创建，按扩展名判断类型
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> AppResult<Self> {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).ok_or_else(|| {
            AppError::Extraction(ExtractionError::UnsupportedFile {
                file_name: file_name.clone(),
            })
        })?;
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// 从磁盘读取文件
    pub async fn from_path(path: &Path) -> AppResult<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // 先检查类型，避免读取无用的大文件
        content_type_for(&file_name).ok_or_else(|| {
            AppError::Extraction(ExtractionError::UnsupportedFile {
                file_name: file_name.clone(),
            })
        })?;

        let bytes = fs::read(path).await.map_err(|source| {
            AppError::Extraction(ExtractionError::ReadFailed {
                path: path.display().to_string(),
                source,
            })
        })?;

        Self::new(file_name, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())?
        .to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

/// 报告服务返回的文件，内容不做任何检查
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    /// 保存到指定目录，返回完整路径
    pub async fn save_to(&self, dir: &Path) -> AppResult<PathBuf> {
        let path = dir.join(&self.file_name);
        let save_failed = |source| {
            AppError::Report(ReportError::SaveFailed {
                path: path.display().to_string(),
                source,
            })
        };

        fs::create_dir_all(dir).await.map_err(save_failed)?;
        fs::write(&path, &self.bytes).await.map_err(save_failed)?;

        info!("✓ 报告已保存: {} ({} 字节)", path.display(), self.bytes.len());
        Ok(path)
    }
}
