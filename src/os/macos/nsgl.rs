//! OpenGL contexts through NSGL. macOS only offers legacy 2.1 contexts and
//! forward-compatible core profiles from 3.2 up.

use std::any::Any;
use std::ptr;
use objc2::rc::{Allocated, Retained};
use objc2::runtime::AnyObject;
use objc2::{class, msg_send};
use objc2_foundation::NSString;
use super::ffi::*;
use super::CocoaShared;
use crate::error::{self, Error, Result};
use crate::hint::{ClientApi, ContextConfig, ContextCreationApi, FramebufferConfig, OpenGlProfile, DONT_CARE};
use crate::platform::{GlProc, PlatformContext, WindowId};

/// The zero-terminated pixel format attribute list for a request.
pub(super) fn pixel_format_attribs(fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig) -> Result<Vec<u32>> {
    if ctxconfig.client == ClientApi::OpenGlEs.raw() {
        return error::api_unavailable("NSGL: OpenGL ES is not available on macOS");
    }
    if ctxconfig.source != ContextCreationApi::Native.raw() {
        return error::api_unavailable("NSGL: Only the native context creation API is available");
    }
    if ctxconfig.major > 2 {
        if ctxconfig.major == 3 && ctxconfig.minor < 2 {
            return error::version_unavailable("NSGL: OpenGL 3.0 and 3.1 are not available, but 3.2 and above may be");
        }
        if !ctxconfig.forward || ctxconfig.profile != OpenGlProfile::Core.raw() {
            return error::version_unavailable("NSGL: OpenGL 3.2 and above need a forward-compatible core profile context");
        }
    }

    let mut attribs = vec![NSOpenGLPFAAccelerated, NSOpenGLPFAClosestPolicy];
    if ctxconfig.major >= 4 {
        attribs.extend_from_slice(&[NSOpenGLPFAOpenGLProfile, NSOpenGLProfileVersion4_1Core]);
    } else if ctxconfig.major >= 3 {
        attribs.extend_from_slice(&[NSOpenGLPFAOpenGLProfile, NSOpenGLProfileVersion3_2Core]);
    } else {
        // Core profiles have neither accumulation nor auxiliary buffers.
        let accum = [fbconfig.accum_red_bits, fbconfig.accum_green_bits, fbconfig.accum_blue_bits, fbconfig.accum_alpha_bits];
        if accum.iter().all(|&bits| bits != DONT_CARE) {
            attribs.extend_from_slice(&[NSOpenGLPFAAccumSize, accum.iter().sum::<i32>() as u32]);
        }
        if fbconfig.aux_buffers != DONT_CARE {
            attribs.extend_from_slice(&[NSOpenGLPFAAuxBuffers, fbconfig.aux_buffers as u32]);
        }
    }

    if fbconfig.red_bits != DONT_CARE && fbconfig.green_bits != DONT_CARE && fbconfig.blue_bits != DONT_CARE {
        let color_bits = match fbconfig.red_bits + fbconfig.green_bits + fbconfig.blue_bits {
            0 => 24,
            bits if bits < 15 => 15,
            bits => bits,
        };
        attribs.extend_from_slice(&[NSOpenGLPFAColorSize, color_bits as u32]);
    }
    for &(attrib, bits) in &[
        (NSOpenGLPFAAlphaSize, fbconfig.alpha_bits),
        (NSOpenGLPFADepthSize, fbconfig.depth_bits),
        (NSOpenGLPFAStencilSize, fbconfig.stencil_bits),
    ] {
        if bits != DONT_CARE {
            attribs.extend_from_slice(&[attrib, bits as u32]);
        }
    }
    if fbconfig.stereo {
        return error::format_unavailable("NSGL: Stereo rendering is not available");
    }
    if fbconfig.double_buffer {
        attribs.push(NSOpenGLPFADoubleBuffer);
    }
    if fbconfig.samples != DONT_CARE {
        if fbconfig.samples == 0 {
            attribs.extend_from_slice(&[NSOpenGLPFASampleBuffers, 0]);
        } else {
            attribs.extend_from_slice(&[NSOpenGLPFASampleBuffers, 1, NSOpenGLPFASamples, fbconfig.samples as u32]);
        }
    }
    attribs.push(0);
    Ok(attribs)
}

#[derive(Debug)]
pub(super) struct NsglContext {
    object: Retained<AnyObject>,
    pixel_format: Retained<AnyObject>,
}

impl CocoaShared {
    pub(super) fn nsgl_create_context(&self, id: WindowId, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, share: Option<&NsglContext>) -> Result<NsglContext> {
        let attribs = pixel_format_attribs(fbconfig, ctxconfig)?;
        let view = self.with_window(id, |w| w.view.clone())?;
        unsafe {
            let pixel_format: Allocated<AnyObject> = msg_send![class!(NSOpenGLPixelFormat), alloc];
            let pixel_format: Option<Retained<AnyObject>> = msg_send![pixel_format, initWithAttributes: attribs.as_ptr()];
            let pixel_format = pixel_format
                .ok_or_else(|| Error::format_unavailable("NSGL: Failed to find a suitable pixel format"))?;

            let share = share.map(|s| &*s.object);
            let object: Allocated<AnyObject> = msg_send![class!(NSOpenGLContext), alloc];
            let object: Option<Retained<AnyObject>> = msg_send![object, initWithFormat: &*pixel_format, shareContext: share];
            let object = object.ok_or_else(|| Error::version_unavailable("NSGL: Failed to create OpenGL context"))?;

            if fbconfig.transparent {
                let opaque: i32 = 0;
                let _: () = msg_send![&*object, setValues: &opaque as *const i32, forParameter: NSOpenGLContextParameterSurfaceOpacity];
            }
            let _: () = msg_send![&*view, setWantsBestResolutionOpenGLSurface: true];
            let _: () = msg_send![&*object, setView: &*view];
            self.with_window(id, |w| w.gl = Some(object.clone()))?;
            debug!("NSGL: Created context for window {:?}", id);
            Ok(NsglContext { object, pixel_format })
        }
    }
}

impl NsglContext {
    fn is_current(&self) -> bool {
        let current: Option<Retained<AnyObject>> = unsafe { msg_send![class!(NSOpenGLContext), currentContext] };
        current.map_or(false, |c| ptr::eq(Retained::as_ptr(&c), Retained::as_ptr(&self.object)))
    }
}

impl Drop for NsglContext {
    fn drop(&mut self) {
        if self.is_current() {
            unsafe {
                let _: () = msg_send![class!(NSOpenGLContext), clearCurrentContext];
            }
        }
        trace!("NSGL: Destroying context with pixel format {:p}", Retained::as_ptr(&self.pixel_format));
    }
}

impl PlatformContext for NsglContext {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn make_current(&self, current: bool) -> Result<()> {
        unsafe {
            if current {
                let _: () = msg_send![&*self.object, makeCurrentContext];
            } else {
                let _: () = msg_send![class!(NSOpenGLContext), clearCurrentContext];
            }
        }
        Ok(())
    }
    fn swap_buffers(&self) -> Result<()> {
        unsafe {
            let _: () = msg_send![&*self.object, flushBuffer];
        }
        Ok(())
    }
    fn swap_interval(&self, interval: i32) -> Result<()> {
        unsafe {
            let _: () = msg_send![&*self.object, setValues: &interval as *const i32, forParameter: NSOpenGLContextParameterSwapInterval];
        }
        Ok(())
    }
    fn extension_supported(&self, _name: &str) -> bool {
        // NSGL has no extension string of its own.
        false
    }
    fn get_proc_address(&self, name: &str) -> GlProc {
        let bundle_id = NSString::from_str("com.apple.opengl");
        let symbol = NSString::from_str(name);
        unsafe {
            let bundle = CFBundleGetBundleWithIdentifier(Retained::as_ptr(&bundle_id) as CFStringRef);
            if bundle.is_null() {
                return ptr::null();
            }
            CFBundleGetFunctionPointerForName(bundle, Retained::as_ptr(&symbol) as CFStringRef)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn gl(major: i32, minor: i32) -> ContextConfig {
        ContextConfig { client: ClientApi::OpenGl.raw(), major, minor, ..ContextConfig::default() }
    }

    #[test]
    fn es_is_unavailable() {
        let ctx = ContextConfig { client: ClientApi::OpenGlEs.raw(), ..ContextConfig::default() };
        let e = pixel_format_attribs(&FramebufferConfig::default(), &ctx).unwrap_err();
        assert_eq!(e.kind, ErrorKind::ApiUnavailable);
    }

    #[test]
    fn modern_versions_need_forward_core() {
        let fb = FramebufferConfig::default();
        assert_eq!(pixel_format_attribs(&fb, &gl(3, 1)).unwrap_err().kind, ErrorKind::VersionUnavailable);
        assert_eq!(pixel_format_attribs(&fb, &gl(3, 3)).unwrap_err().kind, ErrorKind::VersionUnavailable);

        let ctx = ContextConfig { forward: true, profile: OpenGlProfile::Core.raw(), ..gl(4, 1) };
        let attribs = pixel_format_attribs(&fb, &ctx).unwrap();
        assert_eq!(&attribs[2..4], &[NSOpenGLPFAOpenGLProfile, NSOpenGLProfileVersion4_1Core]);
        assert!(!attribs.contains(&NSOpenGLPFAAccumSize));
    }

    #[test]
    fn legacy_contexts_get_the_full_framebuffer() {
        let fb = FramebufferConfig {
            red_bits: 2, green_bits: 2, blue_bits: 2,
            accum_red_bits: 16, accum_green_bits: 16, accum_blue_bits: 16, accum_alpha_bits: 16,
            samples: 4,
            ..FramebufferConfig::default()
        };
        let attribs = pixel_format_attribs(&fb, &gl(2, 1)).unwrap();
        let after = |attrib: u32| attribs.iter().position(|&a| a == attrib).map(|i| attribs[i + 1]);
        assert_eq!(after(NSOpenGLPFAAccumSize), Some(64));
        assert_eq!(after(NSOpenGLPFAColorSize), Some(15));
        assert_eq!(after(NSOpenGLPFASamples), Some(4));
        assert_eq!(attribs.last(), Some(&0));
    }

    #[test]
    fn stereo_is_unavailable() {
        let fb = FramebufferConfig { stereo: true, ..FramebufferConfig::default() };
        assert_eq!(pixel_format_attribs(&fb, &gl(2, 1)).unwrap_err().kind, ErrorKind::FormatUnavailable);
    }
}
