use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(GroupId);
id_newtype!(SiteId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub order_num: i64,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
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
    #[serde(default = "default_public")]
    pub is_public: bool,
}

/// A group together with its sites, both in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupWithSites {
    #[serde(flatten)]
    pub group: Group,
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl GroupWithSites {
    pub fn id(&self) -> GroupId {
        self.group.id
    }

    pub fn site(&self, site_id: SiteId) -> Option<&Site> {
        self.sites.iter().find(|site| site.id == site_id)
    }
}

fn default_public() -> bool {
    true
}

/// Finds a group in a loaded tree.
pub fn find_group(groups: &[GroupWithSites], group_id: GroupId) -> Option<&GroupWithSites> {
    groups.iter().find(|group| group.id() == group_id)
}

/// Finds a site anywhere in a loaded tree, regardless of which group owns it.
pub fn find_site(groups: &[GroupWithSites], site_id: SiteId) -> Option<&Site> {
    groups.iter().find_map(|group| group.site(site_id))
}
