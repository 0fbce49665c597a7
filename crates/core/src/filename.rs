/// A file name split on `.` into the leading base name and the ordered chain of
/// extension tokens that follow it.
///
/// `IMG_2086.HEIC.supplemental-metadata.json` becomes base `IMG_2086` with
/// extensions `["HEIC", "supplemental-metadata", "json"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileName {
    pub base: String,
    pub extensions: Vec<String>,
}

impl FileName {
    pub fn parse(name: &str) -> Self {
        let mut tokens = name.split('.');
        let base = tokens.next().unwrap_or_default().to_string();
        let extensions = tokens.map(str::to_string).collect();
        Self { base, extensions }
    }

    pub fn last_extension(&self) -> Option<&str> {
        self.extensions.last().map(String::as_str)
    }

    pub fn first_extension(&self) -> Option<&str> {
        self.extensions.first().map(String::as_str)
    }

    /// Extension token directly before the final one.
    pub fn second_to_last(&self) -> Option<&str> {
        let len = self.extensions.len();
        if len < 2 {
            return None;
        }
        self.extensions.get(len - 2).map(String::as_str)
    }

    pub fn is_json(&self) -> bool {
        self.last_extension() == Some("json")
    }

    /// Base name plus the first extension token, e.g. `IMG_2086.HEIC`.
    ///
    /// Base names containing dots are cut at their first dot, so
    /// `IMG.2086.HEIC.json` yields `IMG.2086`.
    pub fn trimmed_name(&self) -> Option<String> {
        self.first_extension()
            .map(|ext| format!("{}.{}", self.base, ext))
    }

    pub fn with_extensions(&self, extensions: Vec<String>) -> Self {
        Self {
            base: self.base.clone(),
            extensions,
        }
    }

    pub fn to_name(&self) -> String {
        let mut out = self.base.clone();
        for ext in &self.extensions {
            out.push('.');
            out.push_str(ext);
        }
        out
    }
}
