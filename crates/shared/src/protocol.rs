use serde::{Deserialize, Serialize};

use crate::domain::{GroupId, Site, SiteId};

/// One `{id, order_num}` pair of a full-list order write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEntry<Id> {
    pub id: Id,
    pub order_num: i64,
}

pub type GroupOrderEntry = OrderEntry<GroupId>;
pub type SiteOrderEntry = OrderEntry<SiteId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Partial site update. Absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_num: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl SitePatch {
    /// Full-record patch carrying every field of `site`.
    pub fn from_site(site: &Site) -> Self {
        Self {
            group_id: Some(site.group_id),
            order_num: Some(site.order_num),
            name: Some(site.name.clone()),
            url: Some(site.url.clone()),
            icon: Some(site.icon.clone()),
            description: Some(site.description.clone()),
            notes: Some(site.notes.clone()),
            is_public: Some(site.is_public),
        }
    }

    pub fn apply_to(&self, site: &mut Site) {
        if let Some(group_id) = self.group_id {
            site.group_id = group_id;
        }
        if let Some(order_num) = self.order_num {
            site.order_num = order_num;
        }
        if let Some(name) = &self.name {
            site.name = name.clone();
        }
        if let Some(url) = &self.url {
            site.url = url.clone();
        }
        if let Some(icon) = &self.icon {
            site.icon = icon.clone();
        }
        if let Some(description) = &self.description {
            site.description = description.clone();
        }
        if let Some(notes) = &self.notes {
            site.notes = notes.clone();
        }
        if let Some(is_public) = self.is_public {
            site.is_public = is_public;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_num: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub order_num: i64,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSite {
    pub group_id: GroupId,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    pub order_num: i64,
    pub is_public: bool,
}
