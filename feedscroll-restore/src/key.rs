use core::fmt;

/// Separator between the base path and the sub-key. Never part of a stored base path.
pub const SUB_KEY_SEPARATOR: char = '#';

/// Identifies one independent scroll context: a route (path + query) and an optional sub-key
/// such as the active tab of a page with several lists.
///
/// Any fragment on the base path is dropped, so the separator stays unambiguous:
///
/// ```
/// use feedscroll_restore::ScrollKey;
///
/// let key = ScrollKey::new("/feed?sort=new", Some("following"));
/// assert_eq!(key.as_str(), "/feed?sort=new#following");
/// assert_eq!(key.sub_key(), Some("following"));
/// assert_eq!(ScrollKey::new("/feed#top", None).as_str(), "/feed");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScrollKey(String);

impl ScrollKey {
    pub fn new(base_path: &str, sub_key: Option<&str>) -> Self {
        let base = base_path
            .split_once(SUB_KEY_SEPARATOR)
            .map_or(base_path, |(base, _)| base);
        match sub_key.filter(|s| !s.is_empty()) {
            Some(sub) => Self(format!("{base}{SUB_KEY_SEPARATOR}{sub}")),
            None => Self(base.to_owned()),
        }
    }

    pub fn path(base_path: &str) -> Self {
        Self::new(base_path, None)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn base_path(&self) -> &str {
        self.0
            .split_once(SUB_KEY_SEPARATOR)
            .map_or(self.0.as_str(), |(base, _)| base)
    }

    pub fn sub_key(&self) -> Option<&str> {
        self.0.split_once(SUB_KEY_SEPARATOR).map(|(_, sub)| sub)
    }
}

impl AsRef<str> for ScrollKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScrollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ScrollKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScrollKey").field(&self.0).finish()
    }
}
