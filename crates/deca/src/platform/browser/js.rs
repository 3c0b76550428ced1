//! Dynamic access to script-tag JS APIs (Google Maps, gapi).

use js_sys::{Array, Function, Object, Reflect};
use zoon::wasm_bindgen::{JsCast, JsValue};

use super::dom;

/// `window.<path...>`.
pub fn global(path: &[&str]) -> Result<JsValue, JsValue> {
    let window = dom::window().ok_or_else(|| JsValue::from_str("no window"))?;
    get(&window, path)
}

pub fn get(target: &JsValue, path: &[&str]) -> Result<JsValue, JsValue> {
    path.iter()
        .try_fold(target.clone(), |value, key| Reflect::get(&value, &JsValue::from_str(key)))
}

pub fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let function: Function = Reflect::get(target, &JsValue::from_str(method))?.dyn_into()?;
    function.apply(target, &args.iter().collect::<Array>())
}

pub fn construct(constructor: &JsValue, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let constructor: &Function = constructor.dyn_ref().ok_or_else(|| JsValue::from_str("not a constructor"))?;
    Reflect::construct(constructor, &args.iter().collect::<Array>())
}

pub fn object(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).ok();
    }
    object.into()
}

pub fn is_present(value: &JsValue) -> bool {
    !value.is_undefined() && !value.is_null()
}
