//! Server-side rendering of the dashboard skeleton.

pub mod markup;
pub mod orchestrator;
pub mod page;

pub use orchestrator::{InMemoryTemplates, RenderOrchestrator, TemplateStore};
pub use page::{Fragment, Region, RenderedPage, TabBody, TabPane, TabsRegion};
