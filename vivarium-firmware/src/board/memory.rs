//! DMA-capable frame buffer allocation

use esp_idf_sys::{
    heap_caps_free, heap_caps_malloc, MALLOC_CAP_8BIT, MALLOC_CAP_DMA, MALLOC_CAP_INTERNAL,
};
use vivarium_core::traits::memory::{FrameAllocator, FrameBuffer};

/// [`FrameAllocator`] over the ESP-IDF capability heap
///
/// Render buffers must be reachable by the DMA engine feeding the RGB
/// peripheral, so they come from internal RAM with the DMA capability.
pub struct DmaHeap;

impl FrameAllocator for DmaHeap {
    fn alloc(&mut self, len: usize) -> Option<FrameBuffer> {
        let ptr = unsafe {
            heap_caps_malloc(len, MALLOC_CAP_DMA | MALLOC_CAP_INTERNAL | MALLOC_CAP_8BIT)
        } as *mut u8;
        if ptr.is_null() {
            None
        } else {
            Some(FrameBuffer::new(ptr, len))
        }
    }

    fn free(&mut self, buf: FrameBuffer) {
        unsafe { heap_caps_free(buf.as_ptr().cast()) };
    }
}
