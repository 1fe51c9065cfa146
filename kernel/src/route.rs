//! `route_command`: choose the next primitive for an intent.

use tracing::debug;

use crate::core::router::{RouteResult, route};
use crate::io::metadata::load_catalog;
use crate::io::tuple_store::TupleRepository;
use crate::kernel::Kernel;

impl<S: TupleRepository> Kernel<S> {
    /// Route `intent`; an unresolvable `tuple_id` only drops the context note.
    pub fn route_command(&mut self, intent: &str, tuple_id: Option<&str>) -> RouteResult {
        let catalog = load_catalog(&self.assets);
        let tuple = tuple_id.and_then(|id| self.store.find(id));
        let result = route(&catalog, intent, tuple.as_ref());
        debug!(
            primitive = %result.primitive,
            with_tuple = tuple.is_some(),
            "intent routed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::ProjectFixture;

    #[test]
    fn routes_with_embedded_catalog_and_tuple_note() {
        let fixture = ProjectFixture::new().expect("fixture");
        let mut kernel = fixture.kernel().expect("kernel");
        let id = kernel.tuple_init("add auth", None, None).expect("init").id;

        let result = kernel.route_command("explore authentication options", Some(&id));
        assert_eq!(result.primitive, "explore");
        assert_eq!(result.slot, "constraints");
        assert!(result.rationale.ends_with(
            "Note: No invariant defined yet - consider using 'understand' or 'decompose' first."
        ));
    }

    #[test]
    fn unknown_tuple_does_not_fail_routing() {
        let fixture = ProjectFixture::new().expect("fixture");
        let mut kernel = fixture.kernel().expect("kernel");
        let result = kernel.route_command("verify the design is correct", Some("run-0-gone00"));
        assert_eq!(result.primitive, "validate");
        assert!(!result.rationale.contains("Note:"));
    }

    #[test]
    fn project_metadata_overrides_catalog() {
        let fixture = ProjectFixture::new().expect("fixture");
        fixture
            .write_project(
                "commands/metadata.yaml",
                "primitives:\n  trace:\n    slot: Constraints\n    mode: forensic\n    description: Follow the data\n",
            )
            .expect("write");
        let mut kernel = fixture.kernel().expect("kernel");

        let traced = kernel.route_command("trace why the build fails", None);
        assert_eq!(traced.mode, "forensic");
        assert_eq!(traced.description, "Follow the data");

        // Primitives missing from a loaded catalog get placeholder metadata.
        let explored = kernel.route_command("hello", None);
        assert_eq!(explored.primitive, "explore");
        assert_eq!(explored.mode, "unknown");
        assert!(explored.execution_hints.is_empty());
    }
}
