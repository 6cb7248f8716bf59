//! Component fragment renderers

pub mod alicloud;
pub mod aws;
pub mod azure;

use std::collections::HashMap;
use std::sync::Arc;

use super::hcl::Block;
use super::{ComponentContext, RenderContext};
use crate::models::config::{CloudProvider, ComponentKind, ComponentSelection};

/// Renders the blocks for one selected component on one provider
pub trait FragmentRenderer: Send + Sync {
    fn render(&self, ctx: &RenderContext<'_>, component: &ComponentContext<'_>) -> Vec<Block>;
}

/// Renderers keyed by (provider id, component id)
pub struct ComponentRegistry {
    renderers: HashMap<(String, String), Arc<dyn FragmentRenderer>>,
}

impl ComponentRegistry {
    /// Registry without any renderers
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Registry with every built-in renderer
    pub fn builtin() -> Self {
        let mut registry = Self::empty();

        registry.register("aws", ComponentKind::LoadBalancer.id(), Arc::new(aws::LoadBalancer));
        registry.register("aws", ComponentKind::ObjectStorage.id(), Arc::new(aws::ObjectStorage));
        registry.register("aws", ComponentKind::Database.id(), Arc::new(aws::Database));
        registry.register("aws", ComponentKind::TransitGateway.id(), Arc::new(aws::TransitGateway));
        registry.register("aws", ComponentKind::Compute.id(), Arc::new(aws::Compute));

        registry.register("azure", ComponentKind::LoadBalancer.id(), Arc::new(azure::LoadBalancer));
        registry.register("azure", ComponentKind::ObjectStorage.id(), Arc::new(azure::ObjectStorage));
        registry.register("azure", ComponentKind::Database.id(), Arc::new(azure::Database));
        registry.register("azure", ComponentKind::Compute.id(), Arc::new(azure::Compute));

        registry.register("alicloud", ComponentKind::LoadBalancer.id(), Arc::new(alicloud::LoadBalancer));
        registry.register("alicloud", ComponentKind::ObjectStorage.id(), Arc::new(alicloud::ObjectStorage));
        registry.register("alicloud", ComponentKind::Database.id(), Arc::new(alicloud::Database));
        registry.register("alicloud", ComponentKind::TransitGateway.id(), Arc::new(alicloud::TransitGateway));

        registry
    }

    /// Add or replace the renderer for a provider/component pair
    pub fn register(
        &mut self,
        provider: &str,
        component: &str,
        renderer: Arc<dyn FragmentRenderer>,
    ) {
        self.renderers
            .insert((provider.to_string(), component.to_string()), renderer);
    }

    /// Renderer for a selection. Aliases resolve through the canonical
    /// component id.
    pub fn get(
        &self,
        provider: &CloudProvider,
        selection: &ComponentSelection,
    ) -> Option<&dyn FragmentRenderer> {
        let provider = provider.id().to_string();
        self.renderers
            .get(&(provider.clone(), selection.value.clone()))
            .or_else(|| {
                let kind = selection.kind()?;
                self.renderers.get(&(provider, kind.id().to_string()))
            })
            .map(|renderer| renderer.as_ref())
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
