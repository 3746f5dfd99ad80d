//! UI toolkit port
//!
//! The GUI toolkit is an external collaborator consumed only through the
//! port traits in `vivarium-core::traits::ui`; its rendering and widget
//! tree are not part of this repository. This module is where the
//! toolkit binding plugs in: [`ToolkitPort`] satisfies the display
//! registration, render-done, and object-tree contracts so the full
//! bring-up/teardown stack runs against it unchanged.

use log::debug;
use vivarium_core::traits::memory::FrameBuffer;
use vivarium_core::traits::ui::{RenderMode, UiDisplay, UiToolkit, UiTree};
use vivarium_core::Error;

/// Port-side toolkit handle
pub struct ToolkitPort {
    next_object: u32,
    live_objects: u32,
    styles_live: bool,
}

impl ToolkitPort {
    pub fn new() -> Self {
        Self {
            next_object: 1,
            live_objects: 0,
            styles_live: false,
        }
    }

    /// Periodic timer/event processing slot, called from the UI tick
    /// loop. The toolkit binding performs rendering here and presents
    /// dirty regions through the registered flush callback.
    pub fn tick(&mut self) {}
}

/// Port-side display object
pub struct PortDisplay {
    h_res: u16,
    v_res: u16,
}

impl UiToolkit for ToolkitPort {
    type Display = PortDisplay;

    fn create_display(&mut self, h_res: u16, v_res: u16) -> Result<Self::Display, Error> {
        debug!("toolkit display created ({}x{})", h_res, v_res);
        Ok(PortDisplay { h_res, v_res })
    }
}

impl UiDisplay for PortDisplay {
    fn set_buffers(
        &mut self,
        buf_a: &FrameBuffer,
        buf_b: &FrameBuffer,
        _mode: RenderMode,
    ) -> Result<(), Error> {
        debug!(
            "buffers registered for {}x{}: {} + {} bytes",
            self.h_res,
            self.v_res,
            buf_a.len(),
            buf_b.len()
        );
        Ok(())
    }

    fn flush_complete(&mut self) {}

    fn delete(self) {}
}

impl UiTree for ToolkitPort {
    type Object = u32;

    fn styles_init(&mut self) -> Result<(), Error> {
        self.styles_live = true;
        Ok(())
    }

    fn styles_deinit(&mut self) {
        self.styles_live = false;
    }

    fn create_screen(&mut self) -> Result<Self::Object, Error> {
        let id = self.next_object;
        self.next_object += 1;
        self.live_objects += 1;
        Ok(id)
    }

    fn create_container(&mut self, _parent: &Self::Object) -> Result<Self::Object, Error> {
        let id = self.next_object;
        self.next_object += 1;
        self.live_objects += 1;
        Ok(id)
    }

    fn delete_object(&mut self, _obj: Self::Object) {
        self.live_objects = self.live_objects.saturating_sub(1);
    }
}

impl Default for ToolkitPort {
    fn default() -> Self {
        Self::new()
    }
}
