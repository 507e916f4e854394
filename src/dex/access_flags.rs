use bitflags::bitflags;

bitflags! {
    /// Access flags of classes, fields, and methods
    ///
    /// Dex files use one flag space for all three kinds of declarations, so some bits are
    /// aliased (eg. `VOLATILE` on a field is `BRIDGE` on a method). The masks below describe
    /// which bits are meaningful on each kind of declaration.
    ///
    /// See <https://source.android.com/docs/core/runtime/dex-format#access-flags>
    pub struct AccessFlags: u32 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;

        /// Constructors and static initializers
        const CONSTRUCTOR = 0x10000;

        /// Methods declared `synchronized` (the runtime handles locking)
        const DECLARED_SYNCHRONIZED = 0x20000;
    }
}

impl AccessFlags {
    /// Flags allowed on a top-level class
    pub const CLASS_FLAGS: AccessFlags = AccessFlags::from_bits_truncate(
        AccessFlags::PUBLIC.bits()
            | AccessFlags::FINAL.bits()
            | AccessFlags::INTERFACE.bits()
            | AccessFlags::ABSTRACT.bits()
            | AccessFlags::SYNTHETIC.bits()
            | AccessFlags::ANNOTATION.bits()
            | AccessFlags::ENUM.bits(),
    );

    /// Flags allowed on a field
    pub const FIELD_FLAGS: AccessFlags = AccessFlags::from_bits_truncate(
        AccessFlags::PUBLIC.bits()
            | AccessFlags::PRIVATE.bits()
            | AccessFlags::PROTECTED.bits()
            | AccessFlags::STATIC.bits()
            | AccessFlags::FINAL.bits()
            | AccessFlags::VOLATILE.bits()
            | AccessFlags::TRANSIENT.bits()
            | AccessFlags::SYNTHETIC.bits()
            | AccessFlags::ENUM.bits(),
    );

    /// Flags allowed on a method
    pub const METHOD_FLAGS: AccessFlags = AccessFlags::from_bits_truncate(
        AccessFlags::PUBLIC.bits()
            | AccessFlags::PRIVATE.bits()
            | AccessFlags::PROTECTED.bits()
            | AccessFlags::STATIC.bits()
            | AccessFlags::FINAL.bits()
            | AccessFlags::SYNCHRONIZED.bits()
            | AccessFlags::BRIDGE.bits()
            | AccessFlags::VARARGS.bits()
            | AccessFlags::NATIVE.bits()
            | AccessFlags::ABSTRACT.bits()
            | AccessFlags::STRICT.bits()
            | AccessFlags::SYNTHETIC.bits()
            | AccessFlags::CONSTRUCTOR.bits()
            | AccessFlags::DECLARED_SYNCHRONIZED.bits(),
    );

    /// Methods which are never dispatched virtually
    pub fn is_direct(&self) -> bool {
        self.intersects(AccessFlags::STATIC | AccessFlags::PRIVATE | AccessFlags::CONSTRUCTOR)
    }

    /// Methods which have no code attached
    pub fn is_bodiless(&self) -> bool {
        self.intersects(AccessFlags::ABSTRACT | AccessFlags::NATIVE)
    }
}
