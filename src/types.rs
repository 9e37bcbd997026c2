#[derive(PartialEq, Eq, Clone, Copy, Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertType {
    Anon,
    User,
    Bot,
}

impl ToString for AssertType {
    fn to_string(&self) -> String {
        match *self {
            Self::Anon => String::from("anon"),
            Self::User => String::from("user"),
            Self::Bot => String::from("bot"),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, serde::Deserialize)]
pub struct LoginCredential {
    pub username: String,
    pub password: String,
}

/// Connection profile for one wiki site.
///
/// `api` is the full URL of the `api.php` endpoint. The remaining fields
/// become default request parameters, applied only when a request does not
/// set them itself.
#[derive(PartialEq, Eq, Clone, Debug, serde::Deserialize)]
pub struct SiteProfile {
    pub api: String,
    pub assert: Option<AssertType>,
    pub maxlag: Option<u64>,
    pub user_agent: Option<String>,
}
