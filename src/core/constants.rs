/// Names and defaults shared across indexing, migration and analysis.

/// Element names of the descriptor format
pub mod elements {
    pub const PROJECT: &str = "Project";
    pub const PROPERTY_GROUP: &str = "PropertyGroup";
    pub const ITEM_GROUP: &str = "ItemGroup";
}

/// Attribute names with structural meaning; never treated as item metadata
pub mod attributes {
    pub const CONDITION: &str = "Condition";
    pub const INCLUDE: &str = "Include";
    pub const UPDATE: &str = "Update";
    pub const REMOVE: &str = "Remove";
    pub const EXCLUDE: &str = "Exclude";

    pub const STRUCTURAL: &[&str] = &[CONDITION, INCLUDE, UPDATE, REMOVE, EXCLUDE];
}

/// Item kinds recognised by the indexer and the dependency collector
pub mod item_kinds {
    pub const USING: &str = "Using";
    pub const PACKAGE_REFERENCE: &str = "PackageReference";

    pub const DEFAULT_INDEXED: &[&str] = &[USING, PACKAGE_REFERENCE];
}

/// Property and metadata names read by the environment lookup and collector
pub mod well_known {
    pub const TARGET_FRAMEWORK: &str = "TargetFramework";
    pub const TARGET_FRAMEWORKS: &str = "TargetFrameworks";
    pub const VERSION: &str = "Version";
    pub const UNKNOWN_ENVIRONMENT: &str = "unknown";
}

/// Properties that identify a single project. Unifying any of these would
/// silently give every project the same identity or output location.
pub const PER_PROJECT_PROPERTIES: &[&str] = &[
    "ProjectGuid",
    "AssemblyName",
    "RootNamespace",
    "OutputPath",
    "BaseOutputPath",
    "IntermediateOutputPath",
    "DocumentationFile",
    "ApplicationIcon",
    "Win32Resource",
    "SignAssembly",
    "AssemblyOriginatorKeyFile",
];

pub const DEFAULT_THRESHOLD: f64 = 0.6;

pub const SHARED_DESCRIPTOR_FILE: &str = "Directory.Build.props";

pub const CONFIG_FILE: &str = "buildprops.toml";

/// Extensions of project descriptors picked up by directory discovery
pub const PROJECT_EXTENSIONS: &[&str] = &["csproj", "fsproj", "vbproj"];

/// Directories never descended into during discovery
pub const SKIPPED_DIRECTORIES: &[&str] = &["bin", "obj", "node_modules"];

/// Content of a freshly created shared descriptor
pub const EMPTY_DESCRIPTOR: &str = "<Project>\n</Project>\n";

/// Indentation unit used when no existing indentation can be inferred
pub const DEFAULT_INDENT: &str = "  ";
