//! The core inspector set: a representative sample, not an exhaustive
//! Java-analysis rule set. More inspectors can be registered without
//! touching the scheduler.

pub mod class_origin;
pub mod extension_language;
pub mod inheritance_depth;
pub mod java_loc_metric;
pub mod java_source_collection;
pub mod package_membership;

pub use class_origin::JavaClassOriginInspector;
pub use extension_language::ExtensionLanguageInspector;
pub use inheritance_depth::InheritanceDepthInspector;
pub use java_loc_metric::JavaLocMetricInspector;
pub use java_source_collection::JavaSourceCollectionInspector;
pub use package_membership::PackageMembershipInspector;
