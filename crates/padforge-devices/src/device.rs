//! The per-device record the enumerator maintains.

use padforge_schemas::{
    DeviceCapabilities, DeviceClass, InstanceId, ProductGuid, RawInputState,
};

use crate::backend::{DeviceDescriptor, DeviceDriver};

/// One physical input source, online or remembered.
///
/// Created on first enumeration and kept for the life of the process
/// (and, through the settings document, across processes). The driver
/// handle is present exactly while the device is online; everything
/// else survives disconnects so assignments and flags stay put.
pub struct PhysicalDevice {
    /// Stable instance identifier
    pub instance_id: InstanceId,
    /// Product identity shared across units of the model
    pub product_guid: ProductGuid,
    /// Display name
    pub name: String,
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// Broad classification
    pub class: DeviceClass,
    /// Declared capabilities at last open
    pub capabilities: DeviceCapabilities,
    /// Hidden from the device list
    pub hidden: bool,
    /// Eligible for the pipeline
    pub enabled: bool,
    /// Live raw snapshot, neutral while offline
    pub raw: RawInputState,
    /// Enumeration index at last sighting, for re-open
    pub last_index: usize,
    /// Native pads have no driver handle; the enumerator tracks their
    /// connection state here instead
    pub native_online: bool,
    driver: Option<Box<dyn DeviceDriver>>,
}

impl std::fmt::Debug for PhysicalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDevice")
            .field("instance_id", &self.instance_id)
            .field("name", &self.name)
            .field("class", &self.class)
            .field("online", &self.is_online())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl PhysicalDevice {
    /// Create a record from an enumeration descriptor. Offline until a
    /// driver handle is attached.
    pub fn from_descriptor(instance_id: InstanceId, descriptor: &DeviceDescriptor) -> Self {
        Self {
            instance_id,
            product_guid: ProductGuid::new(descriptor.vendor_id, descriptor.product_id),
            name: descriptor.name.clone(),
            vendor_id: descriptor.vendor_id,
            product_id: descriptor.product_id,
            class: descriptor.class,
            capabilities: DeviceCapabilities::default(),
            hidden: false,
            enabled: true,
            raw: RawInputState::neutral(),
            last_index: 0,
            native_online: false,
            driver: None,
        }
    }

    /// Create the synthetic record for a native pad at an XInput slot.
    pub fn native_pad(slot: u8) -> Self {
        Self {
            instance_id: InstanceId::xinput(slot),
            product_guid: ProductGuid::new(crate::native::XBOX_VENDOR_ID, 0x028E),
            name: format!("Xbox Controller {}", slot + 1),
            vendor_id: crate::native::XBOX_VENDOR_ID,
            product_id: 0x028E,
            class: DeviceClass::Gamepad,
            capabilities: DeviceCapabilities::native_pad(),
            hidden: false,
            enabled: true,
            raw: RawInputState::neutral(),
            last_index: usize::from(slot),
            native_online: false,
            driver: None,
        }
    }

    /// Online iff a driver handle is attached. Native pads have no
    /// handle, so they are online iff the back-end last probed
    /// connected.
    pub fn is_online(&self) -> bool {
        self.driver.is_some() || (self.instance_id.is_xinput() && self.native_online)
    }

    /// Attach a driver handle and adopt its capabilities.
    pub fn attach(&mut self, driver: Box<dyn DeviceDriver>) {
        self.capabilities = driver.capabilities();
        self.driver = Some(driver);
    }

    /// Drop the driver handle (or native connection) and reset the live
    /// snapshot.
    pub fn detach(&mut self) {
        self.driver = None;
        self.native_online = false;
        self.raw.clear();
    }

    /// The attached driver, if online.
    pub fn driver_mut(&mut self) -> Option<&mut (dyn DeviceDriver + 'static)> {
        self.driver.as_deref_mut()
    }

    /// Whether the attached driver still reports the hardware present.
    pub fn still_attached(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| d.still_attached())
    }
}
