//! Builders for domain values used in selector and resolver tests.

use gaffer_core::{FileInfo, FileLocation, Material, MaterialFilter, MaterialStatus, ScalarId};

/// Fluent builder for [`Material`] records.
#[derive(Debug, Clone)]
pub struct MaterialBuilder {
    material: Material,
}

impl MaterialBuilder {
    /// Active material of the given type with no file.
    #[must_use]
    pub fn new(material_type: &str) -> Self {
        Self {
            material: Material {
                status: MaterialStatus::Active,
                source_request_id: Some(ScalarId::from("sr-1001")),
                material_type: material_type.to_string(),
                file_info: None,
                material_filter: MaterialFilter::default(),
            },
        }
    }

    /// Set the status verbatim.
    #[must_use]
    pub fn status(mut self, status: &str) -> Self {
        self.material.status = MaterialStatus::from(status.to_string());
        self
    }

    /// Attach a file name and its derived location.
    #[must_use]
    pub fn file(mut self, name: &str) -> Self {
        let url = format!("aspera://{name}");
        self.material.file_info = Some(FileInfo {
            name: Some(name.to_string()),
            location: Some(FileLocation {
                url: Some(url.clone()),
            }),
        });
        self.material.material_filter.file_name = Some(name.to_string());
        self.material.material_filter.file_location_url = Some(url);
        self
    }

    /// Set the language.
    #[must_use]
    pub fn language(mut self, language: &str) -> Self {
        self.material.material_filter.language = Some(language.to_string());
        self
    }

    /// Set the owning source request.
    #[must_use]
    pub fn request(mut self, request_id: &str) -> Self {
        self.material.source_request_id = Some(ScalarId::from(request_id));
        self
    }

    /// Finish the record.
    #[must_use]
    pub fn build(self) -> Material {
        self.material
    }
}
