//! Thin builder over wasm-encoder that keeps sections in the order the
//! WASM spec requires (Type, Import, Function, Global, Export, Code) and
//! coordinates indices across them. Imported functions are indexed before
//! module-defined functions.

use rustc_hash::FxHashMap;
use wasm_encoder::{
    CodeSection, ConstExpr, EntityType, ExportKind, ExportSection, Function, FunctionSection,
    GlobalSection, GlobalType, ImportSection, Module, TypeSection, ValType,
};

/// A registered function type, kept for deduplication
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FunctionType {
    params: Vec<ValType>,
    results: Vec<ValType>,
}

pub struct WasmModuleBuilder {
    type_section: TypeSection,
    import_section: ImportSection,
    function_section: FunctionSection,
    global_section: GlobalSection,
    export_section: ExportSection,
    code_section: CodeSection,

    type_count: u32,
    import_function_count: u32,
    function_count: u32,
    global_count: u32,

    type_cache: FxHashMap<FunctionType, u32>,
}

impl WasmModuleBuilder {
    pub fn new() -> Self {
        WasmModuleBuilder {
            type_section: TypeSection::new(),
            import_section: ImportSection::new(),
            function_section: FunctionSection::new(),
            global_section: GlobalSection::new(),
            export_section: ExportSection::new(),
            code_section: CodeSection::new(),

            type_count: 0,
            import_function_count: 0,
            function_count: 0,
            global_count: 0,

            type_cache: FxHashMap::default(),
        }
    }

    /// Add a function type and return its index.
    /// Identical types are deduplicated.
    pub fn add_function_type(&mut self, params: Vec<ValType>, results: Vec<ValType>) -> u32 {
        let func_type = FunctionType {
            params: params.clone(),
            results: results.clone(),
        };

        if let Some(&existing_index) = self.type_cache.get(&func_type) {
            return existing_index;
        }

        let type_index = self.type_count;
        self.type_section.ty().function(params, results);
        self.type_count += 1;
        self.type_cache.insert(func_type, type_index);

        type_index
    }

    /// Add an imported function and return its function index.
    ///
    /// Must be called before any `add_function`, since imports occupy
    /// the front of the function index space.
    pub fn add_import_function(&mut self, module: &str, name: &str, type_index: u32) -> u32 {
        debug_assert_eq!(self.function_count, 0);

        let function_index = self.import_function_count;
        self.import_section
            .import(module, name, EntityType::Function(type_index));
        self.import_function_count += 1;

        function_index
    }

    /// Add a mutable or immutable i32 global and return its index
    pub fn add_global_i32(&mut self, initial_value: i32, mutable: bool) -> u32 {
        let global_index = self.global_count;
        self.global_section.global(
            GlobalType {
                val_type: ValType::I32,
                mutable,
                shared: false,
            },
            &ConstExpr::i32_const(initial_value),
        );
        self.global_count += 1;

        global_index
    }

    /// Add a module-defined function body and return its function index
    /// (offset past the imports)
    pub fn add_function(&mut self, type_index: u32, function: &Function) -> u32 {
        let function_index = self.import_function_count + self.function_count;
        self.function_section.function(type_index);
        self.code_section.function(function);
        self.function_count += 1;

        function_index
    }

    pub fn add_function_export(&mut self, export_name: &str, function_index: u32) {
        self.export_section
            .export(export_name, ExportKind::Func, function_index);
    }

    /// Assemble the sections into the final module bytes
    pub fn finish(self) -> Vec<u8> {
        let mut module = Module::new();

        module.section(&self.type_section);
        module.section(&self.import_section);
        module.section(&self.function_section);
        module.section(&self.global_section);
        module.section(&self.export_section);
        module.section(&self.code_section);

        module.finish()
    }
}

impl Default for WasmModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
