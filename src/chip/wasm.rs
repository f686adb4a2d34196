use wasmtime::{Engine, Instance, Linker, Memory, Module, Store, TypedFunc, WasmParams, WasmResults};

use crate::error::ChipError;

use super::{ChipCore, ChipType, OutputOffsets};

/// Chip core running inside a WebAssembly module.
///
/// The module must export `memory` plus the functions below (all integer
/// arguments are i32, pan gains are f32). It may not import anything.
///
/// | export | params |
/// | --- | --- |
/// | `configure` | chip type, clock Hz, sample rate |
/// | `set_pan` | channel, left, right |
/// | `set_tone` / `set_volume` | channel, value |
/// | `set_mixer` | channel, tone off, noise off, envelope on |
/// | `set_noise` / `set_envelope` / `set_envelope_shape` | value |
/// | `process` / `remove_dc` | - |
///
/// After `process` the left and right samples are read as little-endian f32
/// from the configured [`OutputOffsets`].
pub struct WasmChipCore {
    store: Store<()>,
    memory: Memory,
    offsets: OutputOffsets,
    configure_fn: TypedFunc<(i32, i32, i32), ()>,
    set_pan_fn: TypedFunc<(i32, f32, f32), ()>,
    set_tone_fn: TypedFunc<(i32, i32), ()>,
    set_volume_fn: TypedFunc<(i32, i32), ()>,
    set_mixer_fn: TypedFunc<(i32, i32, i32, i32), ()>,
    set_noise_fn: TypedFunc<i32, ()>,
    set_envelope_fn: TypedFunc<i32, ()>,
    set_envelope_shape_fn: TypedFunc<i32, ()>,
    process_fn: TypedFunc<(), ()>,
    remove_dc_fn: TypedFunc<(), ()>,
}

impl WasmChipCore {
    /// Compile and instantiate a chip module
    pub fn load(bytes: &[u8], offsets: OutputOffsets) -> Result<Self, ChipError> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(|e| ChipError::Compile(e.to_string()))?;
        let mut store = Store::new(&engine, ());
        let linker = Linker::new(&engine);
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| ChipError::Instantiate(e.to_string()))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or(ChipError::MissingExport("memory"))?;

        // Reactor-style modules run their static constructors here
        if let Ok(initialize) = instance.get_typed_func::<(), ()>(&mut store, "_initialize") {
            initialize
                .call(&mut store, ())
                .map_err(|e| trap("_initialize", e))?;
        }

        let core = Self {
            configure_fn: export(&instance, &mut store, "configure")?,
            set_pan_fn: export(&instance, &mut store, "set_pan")?,
            set_tone_fn: export(&instance, &mut store, "set_tone")?,
            set_volume_fn: export(&instance, &mut store, "set_volume")?,
            set_mixer_fn: export(&instance, &mut store, "set_mixer")?,
            set_noise_fn: export(&instance, &mut store, "set_noise")?,
            set_envelope_fn: export(&instance, &mut store, "set_envelope")?,
            set_envelope_shape_fn: export(&instance, &mut store, "set_envelope_shape")?,
            process_fn: export(&instance, &mut store, "process")?,
            remove_dc_fn: export(&instance, &mut store, "remove_dc")?,
            store,
            memory,
            offsets,
        };

        let size = core.memory.data_size(&core.store);
        for offset in [offsets.left, offsets.right] {
            if offset.checked_add(4).map_or(true, |end| end > size) {
                return Err(ChipError::MemoryOutOfBounds(offset));
            }
        }
        Ok(core)
    }

    fn read_f32(&self, offset: usize) -> Result<f32, ChipError> {
        let mut bytes = [0u8; 4];
        self.memory
            .read(&self.store, offset, &mut bytes)
            .map_err(|_| ChipError::MemoryOutOfBounds(offset))?;
        Ok(f32::from_le_bytes(bytes))
    }
}

fn export<P, R>(instance: &Instance, store: &mut Store<()>, name: &'static str) -> Result<TypedFunc<P, R>, ChipError>
where
    P: WasmParams,
    R: WasmResults,
{
    instance
        .get_typed_func::<P, R>(&mut *store, name)
        .map_err(|_| ChipError::MissingExport(name))
}

fn trap(call: &'static str, err: wasmtime::Error) -> ChipError {
    ChipError::Trap {
        call,
        reason: err.to_string(),
    }
}

impl ChipCore for WasmChipCore {
    fn configure(&mut self, chip_type: ChipType, clock_hz: u32, sample_rate: u32) -> Result<(), ChipError> {
        self.configure_fn
            .call(&mut self.store, (chip_type as i32, clock_hz as i32, sample_rate as i32))
            .map_err(|e| trap("configure", e))
    }

    fn set_pan(&mut self, channel: usize, left: f32, right: f32) -> Result<(), ChipError> {
        self.set_pan_fn
            .call(&mut self.store, (channel as i32, left, right))
            .map_err(|e| trap("set_pan", e))
    }

    fn set_tone(&mut self, channel: usize, period: u16) -> Result<(), ChipError> {
        self.set_tone_fn
            .call(&mut self.store, (channel as i32, period as i32))
            .map_err(|e| trap("set_tone", e))
    }

    fn set_volume(&mut self, channel: usize, level: u8) -> Result<(), ChipError> {
        self.set_volume_fn
            .call(&mut self.store, (channel as i32, level as i32))
            .map_err(|e| trap("set_volume", e))
    }

    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) -> Result<(), ChipError> {
        self.set_mixer_fn
            .call(
                &mut self.store,
                (channel as i32, tone_off as i32, noise_off as i32, envelope_on as i32),
            )
            .map_err(|e| trap("set_mixer", e))
    }

    fn set_noise(&mut self, value: u8) -> Result<(), ChipError> {
        self.set_noise_fn
            .call(&mut self.store, value as i32)
            .map_err(|e| trap("set_noise", e))
    }

    fn set_envelope(&mut self, period: u16) -> Result<(), ChipError> {
        self.set_envelope_fn
            .call(&mut self.store, period as i32)
            .map_err(|e| trap("set_envelope", e))
    }

    fn set_envelope_shape(&mut self, shape: u8) -> Result<(), ChipError> {
        self.set_envelope_shape_fn
            .call(&mut self.store, shape as i32)
            .map_err(|e| trap("set_envelope_shape", e))
    }

    fn process(&mut self) -> Result<(), ChipError> {
        self.process_fn
            .call(&mut self.store, ())
            .map_err(|e| trap("process", e))
    }

    fn remove_dc(&mut self) -> Result<(), ChipError> {
        self.remove_dc_fn
            .call(&mut self.store, ())
            .map_err(|e| trap("remove_dc", e))
    }

    fn output(&mut self) -> Result<(f32, f32), ChipError> {
        Ok((self.read_f32(self.offsets.left)?, self.read_f32(self.offsets.right)?))
    }
}
