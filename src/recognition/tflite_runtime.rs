//! TensorFlow Lite inference through the C API, loaded at runtime.
//!
//! The shared library is opened with `libloading` so the crate builds without
//! TensorFlow installed; a missing library surfaces as a model load error.

use std::ffi::{CString, c_char, c_int, c_void};
use std::path::Path;

use libloading::Library;
use ndarray::ArrayView3;
use tracing::{debug, info};

use super::engine::InferenceEngine;
use super::error::RecognitionError;

#[repr(C)]
struct TfLiteModel;
#[repr(C)]
struct TfLiteInterpreterOptions;
#[repr(C)]
struct TfLiteInterpreter;
#[repr(C)]
struct TfLiteTensor;

type TfLiteStatus = c_int;
type TfLiteType = c_int;

const TFLITE_OK: TfLiteStatus = 0;
const TFLITE_FLOAT32: TfLiteType = 1;

/// A loaded `.tflite` model with its interpreter.
pub struct TfliteRuntime {
    api: TfliteApi,
    model: *mut TfLiteModel,
    options: *mut TfLiteInterpreterOptions,
    interpreter: *mut TfLiteInterpreter,
}

impl TfliteRuntime {
    /// Open the C library at `lib_path`, load the model and allocate tensors.
    pub fn load(model_path: &Path, lib_path: &Path, threads: i32) -> Result<Self, RecognitionError> {
        if !model_path.is_file() {
            return Err(RecognitionError::model_load(model_path, "model file not found"));
        }
        let api = TfliteApi::load(lib_path)?;
        let model_c = CString::new(model_path.to_string_lossy().as_bytes())
            .map_err(|_| RecognitionError::model_load(model_path, "path contains null bytes"))?;
        let model = unsafe { (api.model_create)(model_c.as_ptr()) };
        if model.is_null() {
            return Err(RecognitionError::model_load(
                model_path,
                "not a valid TensorFlow Lite flatbuffer",
            ));
        }
        let options = unsafe { (api.interpreter_options_create)() };
        if options.is_null() {
            unsafe { (api.model_delete)(model) };
            return Err(RecognitionError::model_load(
                model_path,
                "failed to create interpreter options",
            ));
        }
        unsafe { (api.interpreter_options_set_num_threads)(options, threads.max(1)) };
        let interpreter = unsafe { (api.interpreter_create)(model, options) };
        if interpreter.is_null() {
            unsafe { (api.interpreter_options_delete)(options) };
            unsafe { (api.model_delete)(model) };
            return Err(RecognitionError::model_load(
                model_path,
                "failed to create interpreter",
            ));
        }
        let runtime = Self {
            api,
            model,
            options,
            interpreter,
        };
        // From here on Drop releases the native handles.
        let inputs = unsafe { (runtime.api.interpreter_get_input_tensor_count)(interpreter) };
        let outputs = unsafe { (runtime.api.interpreter_get_output_tensor_count)(interpreter) };
        if inputs != 1 || outputs != 1 {
            return Err(RecognitionError::model_load(
                model_path,
                format!("expected one input and one output, found {inputs} and {outputs}"),
            ));
        }
        let status = unsafe { (runtime.api.interpreter_allocate_tensors)(interpreter) };
        if status != TFLITE_OK {
            return Err(RecognitionError::model_load(
                model_path,
                "failed to allocate tensors",
            ));
        }
        info!(
            "Loaded TFLite model {} ({} threads, {:?} classes)",
            model_path.display(),
            threads.max(1),
            runtime.output_len()
        );
        Ok(runtime)
    }

    fn input_tensor(&self) -> Result<*mut TfLiteTensor, RecognitionError> {
        let tensor = unsafe { (self.api.interpreter_get_input_tensor)(self.interpreter, 0) };
        if tensor.is_null() {
            return Err(failure("input tensor unavailable"));
        }
        Ok(tensor)
    }

    fn output_tensor(&self) -> Option<*const TfLiteTensor> {
        let tensor = unsafe { (self.api.interpreter_get_output_tensor)(self.interpreter, 0) };
        (!tensor.is_null()).then_some(tensor)
    }

    fn read_scores(&self) -> Result<Vec<f32>, RecognitionError> {
        let tensor = self
            .output_tensor()
            .ok_or_else(|| failure("output tensor unavailable"))?;
        let tensor_type = unsafe { (self.api.tensor_type)(tensor) };
        if tensor_type != TFLITE_FLOAT32 {
            return Err(failure(format!("unexpected output tensor type {tensor_type}")));
        }
        let element_count: usize = tensor_dims(&self.api, tensor)
            .iter()
            .map(|&dim| dim.max(0) as usize)
            .product();
        if element_count == 0 {
            return Err(failure("output tensor is empty"));
        }
        let mut scores = vec![0.0_f32; element_count];
        let byte_size = scores.len() * std::mem::size_of::<f32>();
        let status = unsafe {
            (self.api.tensor_copy_to_buffer)(tensor, scores.as_mut_ptr() as *mut c_void, byte_size)
        };
        if status != TFLITE_OK {
            return Err(failure("failed to read output tensor"));
        }
        Ok(scores)
    }
}

impl InferenceEngine for TfliteRuntime {
    fn resize_input(&mut self, dims: &[usize]) -> Result<(), RecognitionError> {
        let dims_c = dims
            .iter()
            .map(|&dim| c_int::try_from(dim).map_err(|_| failure(format!("dimension {dim} too large"))))
            .collect::<Result<Vec<c_int>, _>>()?;
        let status = unsafe {
            (self.api.interpreter_resize_input_tensor)(
                self.interpreter,
                0,
                dims_c.as_ptr(),
                dims_c.len() as c_int,
            )
        };
        if status != TFLITE_OK {
            return Err(failure(format!("failed to resize input to {dims:?}")));
        }
        let status = unsafe { (self.api.interpreter_allocate_tensors)(self.interpreter) };
        if status != TFLITE_OK {
            return Err(failure(format!("failed to allocate tensors for {dims:?}")));
        }
        debug!("Resized TFLite input to {dims:?}");
        Ok(())
    }

    fn invoke(&mut self, input: ArrayView3<'_, f32>) -> Result<Vec<f32>, RecognitionError> {
        let data = input
            .as_slice()
            .ok_or_else(|| failure("input tensor is not contiguous"))?;
        let tensor = self.input_tensor()?;
        let tensor_type = unsafe { (self.api.tensor_type)(tensor) };
        if tensor_type != TFLITE_FLOAT32 {
            return Err(failure(format!("unexpected input tensor type {tensor_type}")));
        }
        let expected_bytes = std::mem::size_of_val(data);
        let byte_size = unsafe { (self.api.tensor_byte_size)(tensor) };
        if byte_size != expected_bytes {
            return Err(failure(format!(
                "input tensor holds {byte_size} bytes, features need {expected_bytes}"
            )));
        }
        let status = unsafe {
            (self.api.tensor_copy_from_buffer)(tensor, data.as_ptr() as *const c_void, expected_bytes)
        };
        if status != TFLITE_OK {
            return Err(failure("failed to copy input tensor data"));
        }
        let status = unsafe { (self.api.interpreter_invoke)(self.interpreter) };
        if status != TFLITE_OK {
            return Err(failure("interpreter invocation failed"));
        }
        self.read_scores()
    }

    fn output_len(&self) -> Option<usize> {
        let tensor = self.output_tensor()?;
        let dims = tensor_dims(&self.api, tensor);
        match dims.last() {
            Some(&classes) if classes > 0 => Some(classes as usize),
            _ => None,
        }
    }
}

impl Drop for TfliteRuntime {
    fn drop(&mut self) {
        unsafe {
            (self.api.interpreter_delete)(self.interpreter);
            (self.api.interpreter_options_delete)(self.options);
            (self.api.model_delete)(self.model);
        }
    }
}

fn failure(message: impl Into<String>) -> RecognitionError {
    RecognitionError::RecognitionFailure(message.into())
}

fn tensor_dims(api: &TfliteApi, tensor: *const TfLiteTensor) -> Vec<i32> {
    let dims = unsafe { (api.tensor_num_dims)(tensor) };
    (0..dims.max(0))
        .map(|i| unsafe { (api.tensor_dim)(tensor, i) })
        .collect()
}

/// Function table resolved from the TensorFlow Lite C library.
///
/// The pointers stay valid as long as `_lib` is alive, which the struct
/// guarantees by owning it.
struct TfliteApi {
    _lib: Library,
    model_create: unsafe extern "C" fn(*const c_char) -> *mut TfLiteModel,
    model_delete: unsafe extern "C" fn(*mut TfLiteModel),
    interpreter_options_create: unsafe extern "C" fn() -> *mut TfLiteInterpreterOptions,
    interpreter_options_delete: unsafe extern "C" fn(*mut TfLiteInterpreterOptions),
    interpreter_options_set_num_threads: unsafe extern "C" fn(*mut TfLiteInterpreterOptions, c_int),
    interpreter_create: unsafe extern "C" fn(
        *const TfLiteModel,
        *const TfLiteInterpreterOptions,
    ) -> *mut TfLiteInterpreter,
    interpreter_delete: unsafe extern "C" fn(*mut TfLiteInterpreter),
    interpreter_allocate_tensors: unsafe extern "C" fn(*mut TfLiteInterpreter) -> TfLiteStatus,
    interpreter_resize_input_tensor: unsafe extern "C" fn(
        *mut TfLiteInterpreter,
        i32,
        *const c_int,
        i32,
    ) -> TfLiteStatus,
    interpreter_get_input_tensor_count: unsafe extern "C" fn(*const TfLiteInterpreter) -> c_int,
    interpreter_get_input_tensor:
        unsafe extern "C" fn(*const TfLiteInterpreter, c_int) -> *mut TfLiteTensor,
    interpreter_get_output_tensor_count: unsafe extern "C" fn(*const TfLiteInterpreter) -> c_int,
    interpreter_get_output_tensor:
        unsafe extern "C" fn(*const TfLiteInterpreter, c_int) -> *const TfLiteTensor,
    interpreter_invoke: unsafe extern "C" fn(*mut TfLiteInterpreter) -> TfLiteStatus,
    tensor_copy_from_buffer:
        unsafe extern "C" fn(*mut TfLiteTensor, *const c_void, usize) -> TfLiteStatus,
    tensor_copy_to_buffer:
        unsafe extern "C" fn(*const TfLiteTensor, *mut c_void, usize) -> TfLiteStatus,
    tensor_type: unsafe extern "C" fn(*const TfLiteTensor) -> TfLiteType,
    tensor_num_dims: unsafe extern "C" fn(*const TfLiteTensor) -> c_int,
    tensor_dim: unsafe extern "C" fn(*const TfLiteTensor, c_int) -> c_int,
    tensor_byte_size: unsafe extern "C" fn(*const TfLiteTensor) -> usize,
}

/// Copy a function pointer out of the library's symbol table.
///
/// # Safety
/// `T` must match the C signature of `name`.
unsafe fn symbol<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, libloading::Error> {
    unsafe { lib.get::<T>(name).map(|sym| *sym) }
}

impl TfliteApi {
    fn load(path: &Path) -> Result<Self, RecognitionError> {
        let lib = unsafe { Library::new(path) }
            .map_err(|err| RecognitionError::model_load(path, format!("cannot open TFLite runtime: {err}")))?;
        let resolve = |lib: Library| -> Result<Self, libloading::Error> {
            unsafe {
                Ok(TfliteApi {
                    model_create: symbol(&lib, b"TfLiteModelCreateFromFile\0")?,
                    model_delete: symbol(&lib, b"TfLiteModelDelete\0")?,
                    interpreter_options_create: symbol(&lib, b"TfLiteInterpreterOptionsCreate\0")?,
                    interpreter_options_delete: symbol(&lib, b"TfLiteInterpreterOptionsDelete\0")?,
                    interpreter_options_set_num_threads: symbol(
                        &lib,
                        b"TfLiteInterpreterOptionsSetNumThreads\0",
                    )?,
                    interpreter_create: symbol(&lib, b"TfLiteInterpreterCreate\0")?,
                    interpreter_delete: symbol(&lib, b"TfLiteInterpreterDelete\0")?,
                    interpreter_allocate_tensors: symbol(
                        &lib,
                        b"TfLiteInterpreterAllocateTensors\0",
                    )?,
                    interpreter_resize_input_tensor: symbol(
                        &lib,
                        b"TfLiteInterpreterResizeInputTensor\0",
                    )?,
                    interpreter_get_input_tensor_count: symbol(
                        &lib,
                        b"TfLiteInterpreterGetInputTensorCount\0",
                    )?,
                    interpreter_get_input_tensor: symbol(
                        &lib,
                        b"TfLiteInterpreterGetInputTensor\0",
                    )?,
                    interpreter_get_output_tensor_count: symbol(
                        &lib,
                        b"TfLiteInterpreterGetOutputTensorCount\0",
                    )?,
                    interpreter_get_output_tensor: symbol(
                        &lib,
                        b"TfLiteInterpreterGetOutputTensor\0",
                    )?,
                    interpreter_invoke: symbol(&lib, b"TfLiteInterpreterInvoke\0")?,
                    tensor_copy_from_buffer: symbol(&lib, b"TfLiteTensorCopyFromBuffer\0")?,
                    tensor_copy_to_buffer: symbol(&lib, b"TfLiteTensorCopyToBuffer\0")?,
                    tensor_type: symbol(&lib, b"TfLiteTensorType\0")?,
                    tensor_num_dims: symbol(&lib, b"TfLiteTensorNumDims\0")?,
                    tensor_dim: symbol(&lib, b"TfLiteTensorDim\0")?,
                    tensor_byte_size: symbol(&lib, b"TfLiteTensorByteSize\0")?,
                    _lib: lib,
                })
            }
        };
        resolve(lib).map_err(|err| {
            RecognitionError::model_load(path, format!("missing TFLite symbols: {err}"))
        })
    }
}
