//! Quartz Display Services, Core Foundation, and the AppKit constants the backend
//! passes through `msg_send!`.

#![allow(non_upper_case_globals, non_snake_case, dead_code)]

use std::os::raw::c_void;
use objc2_foundation::{NSPoint, NSRect, NSSize};

pub type CGDirectDisplayID = u32;
pub type CGError = i32;
pub type CGDisplayModeRef = *mut c_void;
pub type CFArrayRef = *const c_void;
pub type CFBundleRef = *const c_void;
pub type CFStringRef = *const c_void;
pub type CFIndex = isize;
pub type CGDisplayReconfigurationCallBack = extern "C" fn(display: CGDirectDisplayID, flags: u32, user_info: *mut c_void);

pub const kCGErrorSuccess: CGError = 0;
pub const kCGDisplayBeginConfigurationFlag: u32 = 1 << 0;

pub const kDisplayModeValidFlag: u32 = 0x0000_0001;
pub const kDisplayModeSafeFlag: u32 = 0x0000_0002;
pub const kDisplayModeInterlacedFlag: u32 = 0x0000_0040;
pub const kDisplayModeStretchedFlag: u32 = 0x0000_0800;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    pub fn CGMainDisplayID() -> CGDirectDisplayID;
    pub fn CGGetOnlineDisplayList(max: u32, displays: *mut CGDirectDisplayID, count: *mut u32) -> CGError;
    pub fn CGDisplayBounds(display: CGDirectDisplayID) -> NSRect;
    pub fn CGDisplayScreenSize(display: CGDirectDisplayID) -> NSSize;
    pub fn CGDisplayUnitNumber(display: CGDirectDisplayID) -> u32;
    pub fn CGDisplayIsAsleep(display: CGDirectDisplayID) -> u32;
    pub fn CGDisplayCopyDisplayMode(display: CGDirectDisplayID) -> CGDisplayModeRef;
    pub fn CGDisplayCopyAllDisplayModes(display: CGDirectDisplayID, options: *const c_void) -> CFArrayRef;
    pub fn CGDisplaySetDisplayMode(display: CGDirectDisplayID, mode: CGDisplayModeRef, options: *const c_void) -> CGError;
    pub fn CGDisplayModeGetWidth(mode: CGDisplayModeRef) -> usize;
    pub fn CGDisplayModeGetHeight(mode: CGDisplayModeRef) -> usize;
    pub fn CGDisplayModeGetRefreshRate(mode: CGDisplayModeRef) -> f64;
    pub fn CGDisplayModeGetIOFlags(mode: CGDisplayModeRef) -> u32;
    pub fn CGDisplayModeRelease(mode: CGDisplayModeRef);
    pub fn CGDisplayRegisterReconfigurationCallback(callback: CGDisplayReconfigurationCallBack, user_info: *mut c_void) -> CGError;
    pub fn CGDisplayRemoveReconfigurationCallback(callback: CGDisplayReconfigurationCallBack, user_info: *mut c_void) -> CGError;
    pub fn CGDisplayMoveCursorToPoint(display: CGDirectDisplayID, point: NSPoint) -> CGError;
    pub fn CGWarpMouseCursorPosition(point: NSPoint) -> CGError;
    pub fn CGAssociateMouseAndMouseCursorPosition(connected: u32) -> CGError;
}

#[link(name = "CoreFoundation", kind = "framework")]
extern "C" {
    pub fn CFArrayGetCount(array: CFArrayRef) -> CFIndex;
    pub fn CFArrayGetValueAtIndex(array: CFArrayRef, index: CFIndex) -> *const c_void;
    pub fn CFRelease(cf: *const c_void);
    pub fn CFBundleGetBundleWithIdentifier(id: CFStringRef) -> CFBundleRef;
    pub fn CFBundleGetFunctionPointerForName(bundle: CFBundleRef, name: CFStringRef) -> *const c_void;
}

// NSEventType
pub const NSEventTypeKeyUp: usize = 11;
pub const NSEventTypeApplicationDefined: usize = 15;
pub const NSEventMaskAny: u64 = u64::max_value();

// NSEventModifierFlags
pub const NSEventModifierFlagCapsLock: usize = 1 << 16;
pub const NSEventModifierFlagShift: usize = 1 << 17;
pub const NSEventModifierFlagControl: usize = 1 << 18;
pub const NSEventModifierFlagOption: usize = 1 << 19;
pub const NSEventModifierFlagCommand: usize = 1 << 20;
pub const NSEventModifierFlagDeviceIndependentFlagsMask: usize = 0xFFFF_0000;

// NSWindowStyleMask
pub const NSWindowStyleMaskBorderless: usize = 0;
pub const NSWindowStyleMaskTitled: usize = 1 << 0;
pub const NSWindowStyleMaskClosable: usize = 1 << 1;
pub const NSWindowStyleMaskMiniaturizable: usize = 1 << 2;
pub const NSWindowStyleMaskResizable: usize = 1 << 3;

// NSWindowLevel
pub const NSNormalWindowLevel: isize = 0;
pub const NSFloatingWindowLevel: isize = 3;
pub const NSMainMenuWindowLevel: isize = 24;

// NSWindowCollectionBehavior
pub const NSWindowCollectionBehaviorManaged: usize = 1 << 2;
pub const NSWindowCollectionBehaviorFullScreenPrimary: usize = 1 << 7;
pub const NSWindowCollectionBehaviorFullScreenNone: usize = 1 << 9;

pub const NSBackingStoreBuffered: usize = 2;
pub const NSWindowTabbingModeDisallowed: isize = 2;
pub const NSApplicationActivationPolicyRegular: isize = 0;
pub const NSTerminateCancel: usize = 0;
pub const NSInformationalRequest: usize = 10;
pub const NSDragOperationGeneric: usize = 4;
pub const NSBitmapFormatAlphaNonpremultiplied: usize = 1 << 1;

// NSTrackingAreaOptions
pub const NSTrackingMouseEnteredAndExited: usize = 0x01;
pub const NSTrackingCursorUpdate: usize = 0x04;
pub const NSTrackingActiveInKeyWindow: usize = 0x20;
pub const NSTrackingAssumeInside: usize = 0x100;
pub const NSTrackingInVisibleRect: usize = 0x200;
pub const NSTrackingEnabledDuringMouseDrag: usize = 0x400;

// NSActivityOptions
pub const NSActivityIdleDisplaySleepDisabled: u64 = 1 << 40;
pub const NSActivityUserInitiated: u64 = 0x00FF_FFFF | (1 << 20);

// NSOpenGLPixelFormatAttribute
pub const NSOpenGLPFADoubleBuffer: u32 = 5;
pub const NSOpenGLPFAStereo: u32 = 6;
pub const NSOpenGLPFAAuxBuffers: u32 = 7;
pub const NSOpenGLPFAColorSize: u32 = 8;
pub const NSOpenGLPFAAlphaSize: u32 = 11;
pub const NSOpenGLPFADepthSize: u32 = 12;
pub const NSOpenGLPFAStencilSize: u32 = 13;
pub const NSOpenGLPFAAccumSize: u32 = 14;
pub const NSOpenGLPFASampleBuffers: u32 = 55;
pub const NSOpenGLPFASamples: u32 = 56;
pub const NSOpenGLPFAAccelerated: u32 = 73;
pub const NSOpenGLPFAClosestPolicy: u32 = 74;
pub const NSOpenGLPFAOpenGLProfile: u32 = 99;
pub const NSOpenGLProfileVersionLegacy: u32 = 0x1000;
pub const NSOpenGLProfileVersion3_2Core: u32 = 0x3200;
pub const NSOpenGLProfileVersion4_1Core: u32 = 0x4100;

// NSOpenGLContextParameter
pub const NSOpenGLContextParameterSwapInterval: isize = 222;
pub const NSOpenGLContextParameterSurfaceOpacity: isize = 236;

pub const NSPasteboardTypeString: &str = "public.utf8-plain-text";
pub const NSPasteboardTypeFileURL: &str = "public.file-url";
pub const NSCalibratedRGBColorSpace: &str = "NSCalibratedRGBColorSpace";
pub const NSDefaultRunLoopMode: &str = "kCFRunLoopDefaultMode";
