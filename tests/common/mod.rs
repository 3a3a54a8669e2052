use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Shared test utilities for building descriptor trees on disk
pub mod test_helpers {
    use super::*;

    /// A build tree in a temporary directory
    pub struct BuildTree {
        dir: TempDir,
        projects: Vec<PathBuf>,
    }

    impl BuildTree {
        pub fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                projects: Vec::new(),
            }
        }

        pub fn root(&self) -> &Path {
            self.dir.path()
        }

        /// Projects in the order they were added
        pub fn projects(&self) -> &[PathBuf] {
            &self.projects
        }

        /// Write `<name>/<name>.csproj`
        pub fn project(&mut self, name: &str, content: &str) -> PathBuf {
            let path = self.write(&format!("{name}/{name}.csproj"), content);
            self.projects.push(path.clone());
            path
        }

        pub fn write(&self, relative: &str, content: &str) -> PathBuf {
            let path = self.root().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        pub fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.root().join(relative)).unwrap()
        }

        pub fn shared_descriptor(&self) -> PathBuf {
            self.root().join("Directory.Build.props")
        }

        /// Relative path to content of every file in the tree
        pub fn snapshot(&self) -> BTreeMap<String, String> {
            WalkDir::new(self.root())
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| {
                    let relative = e
                        .path()
                        .strip_prefix(self.root())
                        .unwrap()
                        .to_string_lossy()
                        .into_owned();
                    (relative, fs::read_to_string(e.path()).unwrap())
                })
                .collect()
        }
    }

    /// SDK-style project with one unconditional property group and one item
    /// group
    pub fn sdk_project(properties: &[(&str, &str)], packages: &[(&str, &str)]) -> String {
        let mut xml = String::from("<Project Sdk=\"Microsoft.NET.Sdk\">\n\n  <PropertyGroup>\n");
        for (name, value) in properties {
            xml.push_str(&format!("    <{name}>{value}</{name}>\n"));
        }
        xml.push_str("  </PropertyGroup>\n");
        if !packages.is_empty() {
            xml.push_str("\n  <ItemGroup>\n");
            for (name, version) in packages {
                xml.push_str(&format!(
                    "    <PackageReference Include=\"{name}\" Version=\"{version}\" />\n"
                ));
            }
            xml.push_str("  </ItemGroup>\n");
        }
        xml.push_str("\n</Project>\n");
        xml
    }
}
