//! The network container: one fluid, the element tables, the result tables.

use pf_core::{
    CircPumpMassId, CircPumpPressureId, CompressorId, ExtGridId, FlowControlId, HeatConsumerId,
    HeatExchangerId, Id, JunctionId, MassStorageId, PipeId, PressureControlId, PumpId, SinkId,
    SourceId, ValveId,
};
use pf_fluids::Fluid;

use crate::cache::SolverCache;
use crate::elements::{
    CircPumpMass, CircPumpPressure, Compressor, ExtGrid, FlowControl, HeatConsumer, HeatExchanger,
    Junction, MassStorage, Pipe, PressureControl, Pump, Sink, Source, Valve,
};
use crate::error::{NetError, NetResult};
use crate::results::{ResultCounts, ResultTables, SolveRecord};

/// The single source of truth for one fluid network.
///
/// Elements are appended through the `add_*` methods which hand back compact
/// ids. The solver reads the tables, attaches its internal structures to
/// [`SolverCache`] and writes the [`ResultTables`] on success.
#[derive(Debug)]
pub struct Network {
    fluid: Fluid,

    pub junctions: Vec<Junction>,
    pub pipes: Vec<Pipe>,
    pub valves: Vec<Valve>,
    pub pumps: Vec<Pump>,
    pub compressors: Vec<Compressor>,
    pub heat_exchangers: Vec<HeatExchanger>,
    pub heat_consumers: Vec<HeatConsumer>,
    pub flow_controls: Vec<FlowControl>,
    pub pressure_controls: Vec<PressureControl>,
    pub ext_grids: Vec<ExtGrid>,
    pub sinks: Vec<Sink>,
    pub sources: Vec<Source>,
    pub mass_storages: Vec<MassStorage>,
    pub circ_pumps_mass: Vec<CircPumpMass>,
    pub circ_pumps_pressure: Vec<CircPumpPressure>,

    /// Result tables of the last successful solve.
    pub res: ResultTables,
    /// Iteration record of the last solve attempt.
    pub record: SolveRecord,
    /// Whether the last solve converged.
    pub converged: bool,
    /// Opaque solver cache (internal tables between solves).
    pub solver_cache: SolverCache,
}

impl Network {
    pub fn new(fluid: Fluid) -> Self {
        Self {
            fluid,
            junctions: Vec::new(),
            pipes: Vec::new(),
            valves: Vec::new(),
            pumps: Vec::new(),
            compressors: Vec::new(),
            heat_exchangers: Vec::new(),
            heat_consumers: Vec::new(),
            flow_controls: Vec::new(),
            pressure_controls: Vec::new(),
            ext_grids: Vec::new(),
            sinks: Vec::new(),
            sources: Vec::new(),
            mass_storages: Vec::new(),
            circ_pumps_mass: Vec::new(),
            circ_pumps_pressure: Vec::new(),
            res: ResultTables::default(),
            record: SolveRecord::default(),
            converged: false,
            solver_cache: SolverCache::default(),
        }
    }

    pub fn fluid(&self) -> &Fluid {
        &self.fluid
    }

    /// Replace the fluid between solves; invalidates cached solver state.
    pub fn set_fluid(&mut self, fluid: Fluid) {
        self.fluid = fluid;
        self.solver_cache.invalidate();
    }

    pub fn add_junction(&mut self, junction: Junction) -> JunctionId {
        self.junctions.push(junction);
        Id::from_index(self.junctions.len() as u32 - 1)
    }

    pub fn add_pipe(&mut self, pipe: Pipe) -> PipeId {
        self.pipes.push(pipe);
        Id::from_index(self.pipes.len() as u32 - 1)
    }

    pub fn add_valve(&mut self, valve: Valve) -> ValveId {
        self.valves.push(valve);
        Id::from_index(self.valves.len() as u32 - 1)
    }

    pub fn add_pump(&mut self, pump: Pump) -> PumpId {
        self.pumps.push(pump);
        Id::from_index(self.pumps.len() as u32 - 1)
    }

    pub fn add_compressor(&mut self, compressor: Compressor) -> CompressorId {
        self.compressors.push(compressor);
        Id::from_index(self.compressors.len() as u32 - 1)
    }

    pub fn add_heat_exchanger(&mut self, hx: HeatExchanger) -> HeatExchangerId {
        self.heat_exchangers.push(hx);
        Id::from_index(self.heat_exchangers.len() as u32 - 1)
    }

    pub fn add_heat_consumer(&mut self, hc: HeatConsumer) -> HeatConsumerId {
        self.heat_consumers.push(hc);
        Id::from_index(self.heat_consumers.len() as u32 - 1)
    }

    pub fn add_flow_control(&mut self, fc: FlowControl) -> FlowControlId {
        self.flow_controls.push(fc);
        Id::from_index(self.flow_controls.len() as u32 - 1)
    }

    pub fn add_pressure_control(&mut self, pc: PressureControl) -> PressureControlId {
        self.pressure_controls.push(pc);
        Id::from_index(self.pressure_controls.len() as u32 - 1)
    }

    pub fn add_ext_grid(&mut self, ext_grid: ExtGrid) -> ExtGridId {
        self.ext_grids.push(ext_grid);
        Id::from_index(self.ext_grids.len() as u32 - 1)
    }

    pub fn add_sink(&mut self, sink: Sink) -> SinkId {
        self.sinks.push(sink);
        Id::from_index(self.sinks.len() as u32 - 1)
    }

    pub fn add_source(&mut self, source: Source) -> SourceId {
        self.sources.push(source);
        Id::from_index(self.sources.len() as u32 - 1)
    }

    pub fn add_mass_storage(&mut self, storage: MassStorage) -> MassStorageId {
        self.mass_storages.push(storage);
        Id::from_index(self.mass_storages.len() as u32 - 1)
    }

    pub fn add_circ_pump_mass(&mut self, pump: CircPumpMass) -> CircPumpMassId {
        self.circ_pumps_mass.push(pump);
        Id::from_index(self.circ_pumps_mass.len() as u32 - 1)
    }

    pub fn add_circ_pump_pressure(&mut self, pump: CircPumpPressure) -> CircPumpPressureId {
        self.circ_pumps_pressure.push(pump);
        Id::from_index(self.circ_pumps_pressure.len() as u32 - 1)
    }

    /// Table lengths used to size result tables.
    pub fn result_counts(&self) -> ResultCounts {
        ResultCounts {
            junction: self.junctions.len(),
            pipe: self.pipes.len(),
            valve: self.valves.len(),
            pump: self.pumps.len(),
            compressor: self.compressors.len(),
            heat_exchanger: self.heat_exchangers.len(),
            heat_consumer: self.heat_consumers.len(),
            flow_control: self.flow_controls.len(),
            pressure_control: self.pressure_controls.len(),
            ext_grid: self.ext_grids.len(),
            circ_pump_mass: self.circ_pumps_mass.len(),
            circ_pump_pressure: self.circ_pumps_pressure.len(),
        }
    }

    fn check_junction(
        &self,
        table: &'static str,
        element: usize,
        junction: JunctionId,
    ) -> NetResult<()> {
        if (junction.index() as usize) < self.junctions.len() {
            Ok(())
        } else {
            Err(NetError::DanglingJunction {
                table,
                element,
                junction: junction.index(),
            })
        }
    }

    /// Validate all junction references; the pre-solve topology check.
    pub fn validate(&self) -> NetResult<()> {
        if self.junctions.is_empty()
            && !(self.pipes.is_empty()
                && self.valves.is_empty()
                && self.pumps.is_empty()
                && self.compressors.is_empty()
                && self.heat_exchangers.is_empty()
                && self.heat_consumers.is_empty()
                && self.flow_controls.is_empty()
                && self.pressure_controls.is_empty()
                && self.ext_grids.is_empty()
                && self.sinks.is_empty()
                && self.sources.is_empty()
                && self.mass_storages.is_empty()
                && self.circ_pumps_mass.is_empty()
                && self.circ_pumps_pressure.is_empty())
        {
            return Err(NetError::InvalidTopology {
                what: "elements present but no junctions defined".into(),
            });
        }

        for (i, p) in self.pipes.iter().enumerate() {
            self.check_junction("pipe", i, p.from)?;
            self.check_junction("pipe", i, p.to)?;
            if p.sections == 0 {
                return Err(NetError::InvalidTopology {
                    what: format!("pipe[{i}] has zero sections"),
                });
            }
        }
        for (i, v) in self.valves.iter().enumerate() {
            self.check_junction("valve", i, v.from)?;
            self.check_junction("valve", i, v.to)?;
        }
        for (i, p) in self.pumps.iter().enumerate() {
            self.check_junction("pump", i, p.from)?;
            self.check_junction("pump", i, p.to)?;
        }
        for (i, c) in self.compressors.iter().enumerate() {
            self.check_junction("compressor", i, c.from)?;
            self.check_junction("compressor", i, c.to)?;
        }
        for (i, h) in self.heat_exchangers.iter().enumerate() {
            self.check_junction("heat_exchanger", i, h.from)?;
            self.check_junction("heat_exchanger", i, h.to)?;
        }
        for (i, h) in self.heat_consumers.iter().enumerate() {
            self.check_junction("heat_consumer", i, h.from)?;
            self.check_junction("heat_consumer", i, h.to)?;
        }
        for (i, f) in self.flow_controls.iter().enumerate() {
            self.check_junction("flow_control", i, f.from)?;
            self.check_junction("flow_control", i, f.to)?;
        }
        for (i, p) in self.pressure_controls.iter().enumerate() {
            self.check_junction("press_control", i, p.from)?;
            self.check_junction("press_control", i, p.to)?;
            self.check_junction("press_control", i, p.controlled_junction)?;
        }
        for (i, e) in self.ext_grids.iter().enumerate() {
            self.check_junction("ext_grid", i, e.junction)?;
        }
        for (i, s) in self.sinks.iter().enumerate() {
            self.check_junction("sink", i, s.junction)?;
        }
        for (i, s) in self.sources.iter().enumerate() {
            self.check_junction("source", i, s.junction)?;
        }
        for (i, s) in self.mass_storages.iter().enumerate() {
            self.check_junction("mass_storage", i, s.junction)?;
        }
        for (i, c) in self.circ_pumps_mass.iter().enumerate() {
            self.check_junction("circ_pump_mass", i, c.flow_junction)?;
            self.check_junction("circ_pump_mass", i, c.return_junction)?;
        }
        for (i, c) in self.circ_pumps_pressure.iter().enumerate() {
            self.check_junction("circ_pump_pressure", i, c.flow_junction)?;
            self.check_junction("circ_pump_pressure", i, c.return_junction)?;
        }
        Ok(())
    }
}
