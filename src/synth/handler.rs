use std::collections::HashMap;

#[cfg(feature = "rtrb")]
use rtrb::Consumer;
use tracing::info;
#[cfg(feature = "rtrb")]
use tracing::{debug, warn};

use crate::config::SynthConfig;
use crate::dsp::mix::sum_in_place;
use crate::error::Error;
use crate::graph::arena::ProcessorGraph;
use crate::graph::node::{NodeId, Output, OutputRef, Rate, Scope};
use crate::graph::value::{SmoothValue, Value};
use crate::synth::build::{Control, VoiceBuilder};
use crate::synth::matrix::{DestinationId, ModulationMatrix, SourceId, ValueHandle};
#[cfg(feature = "rtrb")]
use crate::synth::message::{CommandReceiver, ModulationCommand, ModulationSender};
use crate::synth::voice::Voice;

/// The global graph, a fixed set of voices and the modulation matrix.
///
/// Every structural operation takes `&mut self`, so the graph can never be
/// rewired while a block is being evaluated. Hand changes over from another
/// thread through [`modulation_sender`](Self::modulation_sender).
pub struct VoiceHandler {
    config: SynthConfig,
    globals: ProcessorGraph,
    voices: Vec<Voice>,
    controls: HashMap<String, Control>,
    matrix: ModulationMatrix,
    pitch_wheel: NodeId,
    mod_wheel: NodeId,
    #[cfg(feature = "rtrb")]
    commands: Option<Consumer<ModulationCommand>>,
}

impl VoiceHandler {
    pub fn new(config: SynthConfig) -> Self {
        config.validate();

        let blueprint = VoiceBuilder::new(&config).build();
        let template = Voice::new(blueprint.voice, blueprint.ports);
        let voices = vec![template; config.polyphony];

        info!(
            voices = voices.len(),
            global_nodes = blueprint.globals.len(),
            voice_nodes = voices[0].graph().len(),
            controls = blueprint.controls.len(),
            sources = blueprint.matrix.sources.len(),
            destinations = blueprint.matrix.destinations.len(),
            "voice handler built"
        );

        Self {
            config,
            globals: blueprint.globals,
            voices,
            controls: blueprint.controls,
            matrix: blueprint.matrix,
            pitch_wheel: blueprint.pitch_wheel,
            mod_wheel: blueprint.mod_wheel,
            #[cfg(feature = "rtrb")]
            commands: None,
        }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Evaluate the global graph once, then every sounding voice.
    pub fn process(&mut self, samples: usize) {
        self.globals.process(samples, None);
        for voice in self.voices.iter_mut() {
            voice.process(samples, &self.globals);
        }
    }

    /// Sum the last block of every voice into `out`.
    pub fn mix_into(&self, out: &mut [f32]) {
        for voice in &self.voices {
            let audio = voice.output();
            let n = audio.len().min(out.len());
            sum_in_place(&mut out[..n], &audio[..n]);
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn voice_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.voices.get_mut(index)
    }

    pub fn set_control(&mut self, name: &str, value: f32) -> Result<(), Error> {
        match self.lookup_control(name)? {
            Control::Plain(id) => {
                if let Some(control) = self.globals.processor_mut::<Value>(id) {
                    control.set(value);
                }
            }
            Control::Smooth(id) => {
                if let Some(control) = self.globals.processor_mut::<SmoothValue>(id) {
                    control.set(value);
                }
            }
        }
        Ok(())
    }

    /// The value a control was last set to (the target, for smoothed ones).
    pub fn control(&self, name: &str) -> Result<f32, Error> {
        let value = match self.lookup_control(name)? {
            Control::Plain(id) => self.globals.processor::<Value>(id).map(Value::get),
            Control::Smooth(id) => self.globals.processor::<SmoothValue>(id).map(SmoothValue::get),
        };
        Ok(value.unwrap_or_default())
    }

    pub fn control_names(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    pub fn set_pitch_wheel(&mut self, value: f32) {
        if let Some(wheel) = self.globals.processor_mut::<SmoothValue>(self.pitch_wheel) {
            wheel.set(value);
        }
    }

    pub fn set_mod_wheel(&mut self, value: f32) {
        if let Some(wheel) = self.globals.processor_mut::<SmoothValue>(self.mod_wheel) {
            wheel.set(value);
        }
    }

    pub fn source_id(&self, name: &str) -> Result<SourceId, Error> {
        self.matrix.source_id(name)
    }

    pub fn destination_id(&self, name: &str) -> Result<DestinationId, Error> {
        self.matrix.destination_id(name)
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.matrix.sources.names()
    }

    pub fn destination_names(&self) -> impl Iterator<Item = &str> {
        self.matrix.destinations.names()
    }

    /// New connection depth. Each handle drives at most one connection.
    pub fn create_scale(&mut self, initial: f32) -> ValueHandle {
        let id = self.globals.add(Value::new(initial), Rate::Control, &[]);
        let handle = ValueHandle(id);
        self.matrix.add_scale(handle);
        handle
    }

    pub fn set_scale(&mut self, scale: ValueHandle, value: f32) -> Result<(), Error> {
        if !self.matrix.has_scale(scale) {
            return Err(Error::UnknownScale(scale));
        }
        if let Some(depth) = self.globals.processor_mut::<Value>(scale.0) {
            depth.set(value);
        }
        Ok(())
    }

    /// Remove an idle scale and its node. Its handle becomes unknown.
    pub fn release_scale(&mut self, scale: ValueHandle) -> Result<(), Error> {
        self.matrix.remove_scale(scale)?;
        self.globals.remove(scale.0);
        Ok(())
    }

    pub fn num_connections(&self) -> usize {
        self.matrix.num_connections()
    }

    /// Panics on unknown names or a scale that is already in use.
    pub fn connect_modulation(&mut self, source: &str, destination: &str, scale: ValueHandle) {
        if let Err(error) = self.try_connect_modulation(source, destination, scale) {
            panic!("cannot connect `{source}` to `{destination}`: {error}");
        }
    }

    /// Panics when `scale` drives no live connection into `destination`.
    pub fn disconnect_modulation(&mut self, destination: &str, scale: ValueHandle) {
        if let Err(error) = self.try_disconnect_modulation(destination, scale) {
            panic!("cannot disconnect from `{destination}`: {error}");
        }
    }

    pub fn try_connect_modulation(
        &mut self,
        source: &str,
        destination: &str,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        let source = self.source_id(source)?;
        let destination = self.destination_id(destination)?;
        self.connect_ids(source, destination, scale)
    }

    pub fn try_disconnect_modulation(
        &mut self,
        destination: &str,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        let destination = self.destination_id(destination)?;
        self.disconnect_ids(destination, scale)
    }

    pub fn connect_ids(
        &mut self,
        source: SourceId,
        destination: DestinationId,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        self.matrix.connect(
            &mut self.voices,
            &mut self.globals,
            source,
            destination,
            scale,
        )
    }

    pub fn disconnect_ids(
        &mut self,
        destination: DestinationId,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        self.matrix
            .disconnect(&mut self.voices, &mut self.globals, destination, scale)
    }

    /// Value a destination's accumulator produced in the last block, at
    /// sample 0. Global destinations read the same for every voice.
    pub fn destination_value(&self, voice: usize, destination: &str) -> Result<f32, Error> {
        let destination = self.destination_id(destination)?;
        let output = self.matrix.destination_output(destination);
        Ok(output.and_then(|o| self.read(voice, o)).unwrap_or_default())
    }

    /// Value a modulation source produced in the last block, at sample 0.
    pub fn source_value(&self, voice: usize, source: &str) -> Result<f32, Error> {
        let source = self.source_id(source)?;
        let output = self.matrix.source_output(source);
        Ok(output.and_then(|o| self.read(voice, o)).unwrap_or_default())
    }

    fn read(&self, voice: usize, output: OutputRef) -> Option<f32> {
        let graph = match output.scope {
            Scope::Global => &self.globals,
            Scope::Voice => self.voices.get(voice)?.graph(),
        };
        graph.output(output).map(Output::value)
    }

    /// Sending end of a fresh command queue. A previous queue is dropped
    /// along with anything still in it.
    #[cfg(feature = "rtrb")]
    pub fn modulation_sender(&mut self, capacity: usize) -> ModulationSender {
        let (sender, rx) = ModulationSender::channel(capacity);
        self.commands = Some(rx);
        sender
    }

    /// Apply every queued command. Call between blocks. Returns how many
    /// commands were applied successfully.
    #[cfg(feature = "rtrb")]
    pub fn apply_pending_modulation(&mut self) -> usize {
        let Some(mut rx) = self.commands.take() else {
            return 0;
        };

        let mut applied = 0;
        while let Some(command) = CommandReceiver::pop(&mut rx) {
            let result = match command {
                ModulationCommand::Connect {
                    source,
                    destination,
                    scale,
                } => self.connect_ids(source, destination, scale),
                ModulationCommand::Disconnect { destination, scale } => {
                    self.disconnect_ids(destination, scale)
                }
                ModulationCommand::SetScale { scale, value } => self.set_scale(scale, value),
                ModulationCommand::ReleaseScale(scale) => self.release_scale(scale),
            };

            match result {
                Ok(()) => {
                    debug!(?command, "applied queued modulation command");
                    applied += 1;
                }
                Err(error) => warn!(?command, %error, "dropped queued modulation command"),
            }
        }

        self.commands = Some(rx);
        applied
    }

    fn lookup_control(&self, name: &str) -> Result<Control, Error> {
        self.controls
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownControl(name.to_owned()))
    }
}
