#![allow(dead_code)]

/// Builder for `.tps` descriptor documents to simplify test setup.
///
/// Defaults produce a valid descriptor:
///
/// ```xml
/// <data version="1.0"><struct type="Settings">...</struct></data>
/// ```
pub struct DescriptorBuilder {
    root_tag: String,
    version: Option<String>,
    settings_tag: String,
    settings_type: Option<String>,
    /// Raw XML placed inside the settings block before the file list.
    preamble: Vec<String>,
    files: Vec<String>,
    include_file_list: bool,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self {
            root_tag: "data".to_string(),
            version: Some("1.0".to_string()),
            settings_tag: "struct".to_string(),
            settings_type: Some("Settings".to_string()),
            preamble: Vec::new(),
            files: Vec::new(),
            include_file_list: true,
        }
    }

    pub fn root_tag(mut self, tag: &str) -> Self {
        self.root_tag = tag.to_string();
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn settings_tag(mut self, tag: &str) -> Self {
        self.settings_tag = tag.to_string();
        self
    }

    pub fn settings_type(mut self, ty: Option<&str>) -> Self {
        self.settings_type = ty.map(str::to_string);
        self
    }

    /// Add a `<key>name</key>` followed by a raw value element.
    pub fn key_value(mut self, key: &str, value_xml: &str) -> Self {
        self.preamble.push(format!("<key>{key}</key>{value_xml}"));
        self
    }

    pub fn file(mut self, path: &str) -> Self {
        self.files.push(path.to_string());
        self
    }

    pub fn files<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.files.extend(paths.into_iter().map(str::to_string));
        self
    }

    pub fn without_file_list(mut self) -> Self {
        self.include_file_list = false;
        self
    }

    pub fn build(self) -> String {
        let version = self
            .version
            .map(|v| format!(" version=\"{v}\""))
            .unwrap_or_default();
        let settings_type = self
            .settings_type
            .map(|t| format!(" type=\"{t}\""))
            .unwrap_or_default();

        let mut body = String::new();
        for item in &self.preamble {
            body.push_str("        ");
            body.push_str(item);
            body.push('\n');
        }
        if self.include_file_list {
            body.push_str("        <key>fileList</key>\n        <array>\n");
            for file in &self.files {
                body.push_str(&format!("            <filename>{file}</filename>\n"));
            }
            body.push_str("        </array>\n");
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <{root}{version}>\n    <{st}{settings_type}>\n{body}    </{st}>\n</{root}>\n",
            root = self.root_tag,
            st = self.settings_tag,
        )
    }
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
