//! File downloads and uploads.
//!
//! Both check storage permission first when the target directory is
//! public, then resolve the file, then touch the network.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::multipart;
use crate::http::response::ResponseResult;
use crate::storage::permission::{
    StorageAccess, DOWNLOAD_WRITE_PERMISSION_TAG, UPLOAD_READ_PERMISSION_TAG,
};
use crate::urlrequest::connection::Connection;
use crate::urlrequest::context::RequestContext;
use crate::urlrequest::spec::TransferSpec;
use http::Method;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use url::Url;

#[derive(Debug, Clone)]
pub struct Transfer {
    ctx: Arc<RequestContext>,
}

impl Transfer {
    pub fn new(ctx: Arc<RequestContext>) -> Self {
        Self { ctx }
    }

    /// GET `spec.url` into the resolved file, overwriting it. Returns the
    /// absolute path written.
    ///
    /// A failure part-way may leave a partial file behind.
    pub async fn download(&self, spec: &TransferSpec) -> Result<PathBuf, NetError> {
        let url = Url::parse(&spec.url)?;
        let path = self
            .authorize_and_resolve(spec, DOWNLOAD_WRITE_PERMISSION_TAG, StorageAccess::Write)
            .await?;

        let conn = Connection::open(
            Arc::clone(&self.ctx),
            &url,
            Method::GET,
            spec.connect_timeout,
            spec.read_timeout,
            &spec.headers,
            Some(&spec.query_params),
        )?;
        let mut response = conn.response().await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(NetError::HttpStatus {
                status: status.as_u16(),
            });
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.file_context(parent)?;
        }
        let mut file = tokio::fs::File::create(&path).await.file_context(&path)?;

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.file_context(&path)?;
            written += chunk.len() as u64;
        }
        file.flush().await.file_context(&path)?;

        let path = absolute(path)?;
        tracing::debug!(path = %path.display(), bytes = written, "download complete");
        Ok(path)
    }

    /// POST the resolved file as a multipart form and read the response like
    /// any other request.
    pub async fn upload(&self, spec: &TransferSpec) -> Result<ResponseResult, NetError> {
        let url = Url::parse(&spec.url)?;
        let path = self
            .authorize_and_resolve(spec, UPLOAD_READ_PERMISSION_TAG, StorageAccess::Read)
            .await?;

        let metadata = tokio::fs::metadata(&path).await.file_context(&path)?;
        if !metadata.is_file() {
            return Err(NetError::FileError {
                path: path.display().to_string(),
                message: "not a regular file".to_string(),
            });
        }

        let conn = Connection::open(
            Arc::clone(&self.ctx),
            &url,
            Method::POST,
            spec.connect_timeout,
            spec.read_timeout,
            &spec.headers,
            Some(&spec.query_params),
        )?;

        let field = spec
            .field_name
            .as_deref()
            .unwrap_or(&self.ctx.config().upload_field_name);
        let response = multipart::send_form(conn, &spec.form_fields, Some((field, &path))).await?;
        tracing::debug!(path = %path.display(), status = response.status().as_u16(), "upload sent");
        response.into_result().await
    }

    async fn authorize_and_resolve(
        &self,
        spec: &TransferSpec,
        tag: u32,
        access: StorageAccess,
    ) -> Result<PathBuf, NetError> {
        let resolver = self.ctx.path_resolver();
        let directory = spec.file_directory.as_deref();
        if resolver.is_public_directory(directory) {
            self.ctx.permissions().ensure(tag, access).await?;
        }
        resolver.resolve(&spec.file_path, directory)
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf, NetError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().file_context(Path::new("."))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::permission::{PermissionOutcome, StorageAuthorizer};
    use crate::storage::resolver::{DirectoryResolver, DATA, DOCUMENTS};

    struct NeverAuthorized;

    impl StorageAuthorizer for NeverAuthorized {
        fn is_authorized(&self, _access: StorageAccess) -> bool {
            false
        }

        fn request_authorization(&self, _tag: u32, _access: StorageAccess) {}
    }

    fn context(root: &Path) -> Arc<RequestContext> {
        let mut ctx = RequestContext::new();
        ctx.set_path_resolver(Arc::new(
            DirectoryResolver::new()
                .with_directory(DOCUMENTS, root.join("docs"))
                .with_directory(DATA, root.join("data")),
        ));
        ctx.set_authorizer(Arc::new(NeverAuthorized));
        Arc::new(ctx)
    }

    #[tokio::test]
    async fn test_denied_download_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let transfer = Transfer::new(Arc::clone(&ctx));

        let spec = TransferSpec::new("http://127.0.0.1:9/file", "out.bin").directory(DOCUMENTS);
        let task = tokio::spawn(async move { transfer.download(&spec).await });

        while !ctx.permissions().has_pending(DOWNLOAD_WRITE_PERMISSION_TAG) {
            tokio::task::yield_now().await;
        }
        ctx.permissions()
            .handle_permission_result(DOWNLOAD_WRITE_PERMISSION_TAG, PermissionOutcome::Denied);

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(
            err.reason(),
            "User denied write permission needed to save files"
        );
        assert!(!dir.path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_private_directory_skips_permission() {
        let dir = tempfile::tempdir().unwrap();
        let transfer = Transfer::new(context(dir.path()));

        // No prompt is raised, so the failure comes from the missing file.
        let spec = TransferSpec::new("http://127.0.0.1:9/upload", "missing.txt").directory(DATA);
        let err = transfer.upload(&spec).await.unwrap_err();
        assert!(matches!(err, NetError::FileError { .. }));
    }

    #[tokio::test]
    async fn test_invalid_url_precedes_permission() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let transfer = Transfer::new(Arc::clone(&ctx));

        let spec = TransferSpec::new("::bad::", "a.txt").directory(DOCUMENTS);
        assert_eq!(transfer.upload(&spec).await.unwrap_err(), NetError::InvalidUrl);
        assert!(!ctx.permissions().has_pending(UPLOAD_READ_PERMISSION_TAG));
    }

    #[tokio::test]
    async fn test_parent_components_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let transfer = Transfer::new(context(dir.path()));

        let spec = TransferSpec::new("http://127.0.0.1:9/", "../escape.txt").directory(DATA);
        let err = transfer.download(&spec).await.unwrap_err();
        assert!(matches!(err, NetError::InvalidPath { .. }));
    }
}
