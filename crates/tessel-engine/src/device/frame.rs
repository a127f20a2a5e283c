/// One acquired surface texture and a view of it.
///
/// Hold it only for the duration of a frame: an unpresented surface texture
/// blocks acquisition of the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl GpuFrame {
    /// Presents the frame. Draws must already be submitted to the queue.
    pub fn present(self) {
        drop(self.view);
        self.surface_texture.present();
    }
}
