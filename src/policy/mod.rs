mod factory;
mod locator;
mod model;


pub use factory::{PolicyBuilder, PolicyFactory, XacmlPolicyBuilder};
pub use locator::{
    flatten_descendants, FinderModule, FlatPolicyLocator, LocatorOption, PolicyLocator,
    RecursivePolicyLocator,
};
pub(crate) use model::SetMember;
pub use model::{Policy, PolicyFinder, PolicyKind, PolicyReference};
