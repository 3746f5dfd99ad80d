//! Screen scaffold lifecycle
//!
//! The UI is one main screen with four fixed sections: header, sidebar,
//! content, footer. What goes inside the sections is built elsewhere;
//! this module owns their creation order, the shared style registry
//! pairing, and the teardown of everything already created when a
//! section fails to come up - after a failed init, zero toolkit objects
//! remain and the style registry has been released exactly once.

use heapless::Vec;
use log::{error, info};
use vivarium_core::traits::ui::UiTree;
use vivarium_core::Error;

/// Screen plus the four section containers
const SECTION_COUNT: usize = 5;

/// Root of the screen scaffold
pub struct UiRoot<T: UiTree> {
    screen: Option<T::Object>,
    header: Option<T::Object>,
    sidebar: Option<T::Object>,
    content: Option<T::Object>,
    footer: Option<T::Object>,
}

impl<T: UiTree> UiRoot<T> {
    /// Build the scaffold: styles, screen, then each section in order
    ///
    /// Any failure deletes every object created so far (children before
    /// the screen), releases the styles, and returns the failure - the
    /// caller holds nothing.
    pub fn init(tree: &mut T) -> Result<Self, Error> {
        tree.styles_init()?;

        let mut created: Vec<T::Object, SECTION_COUNT> = Vec::new();
        match Self::build(tree, &mut created) {
            Ok(()) => {
                let footer = created.pop();
                let content = created.pop();
                let sidebar = created.pop();
                let header = created.pop();
                let screen = created.pop();
                info!("screen scaffold ready");
                Ok(Self {
                    screen,
                    header,
                    sidebar,
                    content,
                    footer,
                })
            }
            Err(e) => {
                error!("screen scaffold init failed: {:?}", e);
                while let Some(obj) = created.pop() {
                    tree.delete_object(obj);
                }
                tree.styles_deinit();
                Err(e)
            }
        }
    }

    fn build(tree: &mut T, created: &mut Vec<T::Object, SECTION_COUNT>) -> Result<(), Error> {
        let screen = tree.create_screen()?;
        // Capacity equals the number of pushes; these never fail
        let _ = created.push(screen);
        for _ in 0..4 {
            let section = tree.create_container(&created[0])?;
            let _ = created.push(section);
        }
        Ok(())
    }

    /// Whether every section is present
    pub fn is_complete(&self) -> bool {
        self.screen.is_some()
            && self.header.is_some()
            && self.sidebar.is_some()
            && self.content.is_some()
            && self.footer.is_some()
    }

    /// Tear the scaffold down: sections, then the screen, then styles
    pub fn deinit(mut self, tree: &mut T) {
        for obj in [
            self.footer.take(),
            self.content.take(),
            self.sidebar.take(),
            self.header.take(),
            self.screen.take(),
        ] {
            if let Some(obj) = obj {
                tree.delete_object(obj);
            }
        }
        tree.styles_deinit();
        info!("screen scaffold torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockTree {
        next_id: u32,
        live: Vec<u32, 8>,
        styles_inits: usize,
        styles_deinits: usize,
        containers_created: usize,
        fail_container_at: Option<usize>,
        fail_screen: bool,
    }

    impl MockTree {
        fn new() -> Self {
            Self {
                next_id: 1,
                live: Vec::new(),
                styles_inits: 0,
                styles_deinits: 0,
                containers_created: 0,
                fail_container_at: None,
                fail_screen: false,
            }
        }

        fn spawn(&mut self) -> u32 {
            let id = self.next_id;
            self.next_id += 1;
            self.live.push(id).unwrap();
            id
        }
    }

    impl UiTree for MockTree {
        type Object = u32;

        fn styles_init(&mut self) -> Result<(), Error> {
            self.styles_inits += 1;
            Ok(())
        }

        fn styles_deinit(&mut self) {
            self.styles_deinits += 1;
        }

        fn create_screen(&mut self) -> Result<Self::Object, Error> {
            if self.fail_screen {
                return Err(Error::OutOfMemory);
            }
            Ok(self.spawn())
        }

        fn create_container(&mut self, parent: &Self::Object) -> Result<Self::Object, Error> {
            assert!(self.live.contains(parent));
            if self.fail_container_at == Some(self.containers_created) {
                return Err(Error::OutOfMemory);
            }
            self.containers_created += 1;
            Ok(self.spawn())
        }

        fn delete_object(&mut self, obj: Self::Object) {
            let idx = self.live.iter().position(|&o| o == obj).unwrap();
            self.live.remove(idx);
        }
    }

    #[test]
    fn successful_init_builds_every_section() {
        let mut tree = MockTree::new();
        let root = UiRoot::init(&mut tree).unwrap();

        assert!(root.is_complete());
        assert_eq!(tree.live.len(), 5);
        assert_eq!(tree.styles_inits, 1);
        assert_eq!(tree.styles_deinits, 0);

        root.deinit(&mut tree);
        assert!(tree.live.is_empty());
        assert_eq!(tree.styles_deinits, 1);
    }

    #[test]
    fn header_failure_tears_down_everything_created() {
        let mut tree = MockTree::new();
        tree.fail_container_at = Some(0); // header is the first section

        let result = UiRoot::init(&mut tree);
        assert_eq!(result.err(), Some(Error::OutOfMemory));

        // Styles released exactly as often as registered
        assert_eq!(tree.styles_inits, 1);
        assert_eq!(tree.styles_deinits, 1);

        // Zero toolkit objects remain
        assert!(tree.live.is_empty());
    }

    #[test]
    fn late_section_failure_also_unwinds_the_earlier_ones() {
        let mut tree = MockTree::new();
        tree.fail_container_at = Some(3); // footer

        assert!(UiRoot::init(&mut tree).is_err());
        assert!(tree.live.is_empty());
        assert_eq!(tree.styles_inits, tree.styles_deinits);
    }

    #[test]
    fn screen_failure_releases_only_the_styles() {
        let mut tree = MockTree::new();
        tree.fail_screen = true;

        assert!(UiRoot::init(&mut tree).is_err());
        assert!(tree.live.is_empty());
        assert_eq!(tree.styles_inits, 1);
        assert_eq!(tree.styles_deinits, 1);
    }
}
